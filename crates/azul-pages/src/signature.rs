//! Keyed digest over the ordered field concatenation, both traffic
//! directions.
//!
//! The scheme, shared by both protocol generations: take the direction's
//! ordered field list, substitute the empty string for any missing field,
//! concatenate the values with no separator, append the pre-shared auth key,
//! encode the whole string as UTF-16LE and digest it. V1 uses a bare
//! SHA-512; V2 additionally keys an HMAC-SHA512 with the auth key. The
//! digest is returned as lowercase hex.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha512};

use crate::config::AcquirerConfig;
use crate::error::AzulError;
use crate::protocol::{Direction, ProtocolVersion, SignatureComparison};
use crate::security;

type HmacSha512 = Hmac<Sha512>;

/// Compute the digital signature for one direction of traffic.
///
/// `lookup` resolves a field name to its transmitted value; absent fields
/// contribute the empty string. Pure and deterministic: identical inputs
/// always produce the identical digest.
pub fn sign<'a, F>(
    config: &AcquirerConfig,
    direction: Direction,
    lookup: F,
) -> Result<String, AzulError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    if config.auth_key.is_empty() {
        return Err(AzulError::Configuration("auth key is not set".into()));
    }

    let mut message = String::new();
    for name in config.protocol.signed_fields(direction) {
        message.push_str(lookup(name).unwrap_or(""));
    }
    message.push_str(&config.auth_key);

    // The page hashes the UTF-16LE encoding of the concatenation, not the
    // UTF-8 bytes.
    let bytes = utf16le_bytes(&message);

    let digest = match config.protocol {
        ProtocolVersion::V1 => hex_encode(Sha512::digest(&bytes)),
        ProtocolVersion::V2 => {
            let mut mac = HmacSha512::new_from_slice(config.auth_key.as_bytes())
                .expect("HMAC accepts any key length");
            mac.update(&bytes);
            hex_encode(mac.finalize().into_bytes())
        }
    };
    Ok(digest)
}

/// Compare a claimed hash against the recomputed one under the generation's
/// comparison policy. `true` means the signature is valid.
pub fn matches(config: &AcquirerConfig, computed: &str, claimed: &str) -> bool {
    match config.protocol.comparison() {
        SignatureComparison::CaseInsensitive => computed.eq_ignore_ascii_case(claimed),
        SignatureComparison::Exact => {
            security::constant_time_eq(computed.as_bytes(), claimed.as_bytes())
        }
    }
}

fn utf16le_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    use std::fmt::Write;
    let bytes = bytes.as_ref();
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use std::collections::HashMap;

    fn lookup<'m>(
        map: &'m HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<&'m str> + 'm {
        move |name| map.get(name).copied()
    }

    fn outbound_fixture() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("Azul_MerchantId", "39038540035"),
            ("Azul_MerchantName", "Abasto Mayorista"),
            ("Azul_MerchantType", "Colmado"),
            ("Azul_CurrencyCode", "$"),
            ("Azul_OrderNumber", "SO001"),
            ("Azul_Amount", "11800"),
            ("Azul_ITBIS", "1800"),
            (
                "Azul_ApprovedUrl",
                "https://shop.example.com/payment/azul/approved?return_url=%2Fshop%2Fconfirm",
            ),
            (
                "Azul_DeclinedUrl",
                "https://shop.example.com/payment/azul/declined?return_url=%2Fshop%2Fconfirm",
            ),
            (
                "Azul_CancelUrl",
                "https://shop.example.com/payment/azul/cancel?return_url=%2Fshop%2Fconfirm&reference=SO001",
            ),
            ("Azul_UseCustomField1", "0"),
            ("Azul_CustomField1Label", ""),
            ("Azul_CustomField1Value", ""),
            ("Azul_UseCustomField2", "0"),
            ("Azul_CustomField2Label", ""),
            ("Azul_CustomField2Value", ""),
        ])
    }

    #[test]
    fn v1_outbound_known_vector() {
        let mut config = test_config();
        config.protocol = ProtocolVersion::V1;
        let map = outbound_fixture();
        let digest = sign(&config, Direction::Outbound, lookup(&map)).unwrap();
        assert_eq!(
            digest,
            "3105e4c64149bf802b8f98e2f45073d4e2fb62074656c76e935538c8a0685551\
             b20c7fc63299fbf5f49445ee4837123c2f304ed8ae028d536ac6960a95610907"
        );
    }

    #[test]
    fn v2_inbound_known_vector() {
        let config = test_config();
        let map = HashMap::from([
            ("OrderNumber", "SO001"),
            ("Amount", "11800"),
            ("AuthorizationCode", "OK2025"),
            ("DateTime", "20260807143000"),
            ("ResponseCode", "ISO8583"),
            ("IsoCode", "00"),
            ("ResponseMessage", "APROBADA"),
            ("ErrorDescription", ""),
            ("AzulOrderId", "44196"),
        ]);
        let digest = sign(&config, Direction::Inbound, lookup(&map)).unwrap();
        assert_eq!(
            digest,
            "1e22e4a285b2b1ff435622b253294cad2bc4c5c9c1d1b38c10e41f69e2066339\
             93d69e4a8b9dcc46b65870982ebaf061fd38be0edd31f4a7d58cdbcd9e439f55"
        );
    }

    #[test]
    fn v1_empty_fields_hash_only_the_key() {
        let mut config = test_config();
        config.protocol = ProtocolVersion::V1;
        config.auth_key = "k".into();
        let digest = sign(&config, Direction::Inbound, |_| None).unwrap();
        // sha512 of "k" in UTF-16LE.
        assert_eq!(
            digest,
            "9f880b4229e58d4bb6be79749df7c44256a04438f162de88457b0744aa834385\
             7c92b2dc7bab182dee1afe6d9abd98004edfcb3ede3e52d0b3c7fc33b7ff9b78"
        );
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let config = test_config();
        let map = outbound_fixture();
        let a = sign(&config, Direction::Outbound, lookup(&map)).unwrap();
        let b = sign(&config, Direction::Outbound, lookup(&map)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_signed_field_affects_the_digest() {
        let config = test_config();
        let map = outbound_fixture();
        let baseline = sign(&config, Direction::Outbound, lookup(&map)).unwrap();
        for &name in config.protocol.signed_fields(Direction::Outbound) {
            let mut tampered = map.clone();
            tampered.insert(name, "tampered");
            let digest = sign(&config, Direction::Outbound, lookup(&tampered)).unwrap();
            assert_ne!(digest, baseline, "field {name} did not affect the digest");
        }
    }

    #[test]
    fn generations_disagree_on_the_same_input() {
        let mut v1 = test_config();
        v1.protocol = ProtocolVersion::V1;
        let v2 = test_config();
        let map = outbound_fixture();
        assert_ne!(
            sign(&v1, Direction::Outbound, lookup(&map)).unwrap(),
            sign(&v2, Direction::Outbound, lookup(&map)).unwrap()
        );
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let config = test_config();
        let digest = sign(&config, Direction::Inbound, |_| None).unwrap();
        assert_eq!(digest.len(), 128);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn empty_auth_key_is_a_configuration_error() {
        let mut config = test_config();
        config.auth_key.clear();
        let err = sign(&config, Direction::Outbound, |_| None).unwrap_err();
        assert!(matches!(err, AzulError::Configuration(_)));
    }

    #[test]
    fn comparison_policy_follows_generation() {
        let mut v1 = test_config();
        v1.protocol = ProtocolVersion::V1;
        assert!(matches(&v1, "abc123", "ABC123"));
        let v2 = test_config();
        assert!(!matches(&v2, "abc123", "ABC123"));
        assert!(matches(&v2, "abc123", "abc123"));
    }
}
