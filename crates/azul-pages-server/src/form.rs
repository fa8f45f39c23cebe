//! Renders the auto-submitting redirect form.
//!
//! The page the shopper never sees: every payload field as a hidden input,
//! submitted to the acquirer the moment it loads, with a visible button for
//! browsers with scripting disabled.

use azul_pages::payload::OutboundPayload;

pub fn render_payment_form(action_url: &str, payload: &OutboundPayload) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n");
    html.push_str(
        "<head><meta charset=\"utf-8\"><title>Redirecting to payment page</title></head>\n",
    );
    html.push_str("<body onload=\"document.forms[0].submit()\">\n");
    html.push_str(&format!(
        "  <form method=\"post\" action=\"{}\">\n",
        escape_html(action_url)
    ));
    for (name, value) in payload.entries() {
        html.push_str(&format!(
            "    <input type=\"hidden\" name=\"{}\" value=\"{}\"/>\n",
            escape_html(name),
            escape_html(value)
        ));
    }
    html.push_str("    <noscript><button type=\"submit\">Continue to payment</button></noscript>\n");
    html.push_str("  </form>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
