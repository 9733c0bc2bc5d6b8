//! Record content serialization.
//!
//! [`serialize`] and [`deserialize`] are the round-trip pair used for record
//! content (V2 records store exactly these bytes). The `_v1` variants handle the
//! legacy layout, where text is zero padded and SOL records carry a signature.

use anchor_lang::prelude::Pubkey;

use crate::encoding::{self, EncodingError};
use crate::errors::{Result, SnsError};
use crate::record::{Encoding, Record};

/// Serialize a human-readable record value into its on-chain bytes
pub fn serialize(value: &str, record: Record) -> Result<Vec<u8>> {
    match record.encoding() {
        Encoding::Utf8 => Ok(value.as_bytes().to_vec()),

        Encoding::PunycodeUtf8 => punycode::encode(value)
            .map(String::into_bytes)
            .map_err(|_| SnsError::malformed(record, value, "punycode encoding failed")),

        Encoding::RawAddress | Encoding::Base58 => {
            let width = fixed_width(record);
            encoding::decode_base58_fixed(value, width)
                .map_err(|e| SnsError::malformed(record, value, e.to_string()))
        }

        Encoding::Base58Text => {
            let width = fixed_width(record);
            if value.len() != width || !encoding::is_base58_alphabet(value) {
                return Err(SnsError::malformed(
                    record,
                    value,
                    format!("expected {width} base58 characters"),
                ));
            }
            Ok(value.as_bytes().to_vec())
        }

        Encoding::EvmHex => serialize_evm(value),

        Encoding::Bech32(hrp) => {
            let payload = encoding::decode_bech32(value, hrp)
                .map_err(|e| SnsError::InvalidInjectiveAddress(format!("{value}: {e}")))?;
            if payload.len() != fixed_width(record) {
                return Err(SnsError::InvalidInjectiveAddress(format!(
                    "{value}: payload is {} bytes, expected 20",
                    payload.len()
                )));
            }
            Ok(payload)
        }

        Encoding::DottedQuad => encoding::parse_ipv4(value)
            .map(|b| b.to_vec())
            .map_err(|_| SnsError::InvalidARecord(value.to_string())),

        Encoding::ColonHex => encoding::parse_ipv6(value)
            .map(|b| b.to_vec())
            .map_err(|_| SnsError::InvalidAAAARecord(value.to_string())),
    }
}

/// Deserialize on-chain record bytes back to the human-readable value
///
/// Text records drop trailing zero bytes first; an all-zero buffer is the empty
/// string. Fixed-width records must be exactly their width.
pub fn deserialize(bytes: &[u8], record: Record) -> Result<String> {
    let width = match record.width() {
        None => return deserialize_text(bytes, record),
        Some(width) => width,
    };

    if bytes.len() != width {
        return Err(SnsError::InvalidRecordData {
            record,
            expected: width,
            actual: bytes.len(),
        });
    }

    let malformed = |e: EncodingError| SnsError::malformed(record, &hex::encode(bytes), e.to_string());

    match record.encoding() {
        Encoding::RawAddress | Encoding::Base58 => Ok(encoding::encode_base58(bytes)),

        Encoding::Base58Text => match std::str::from_utf8(bytes) {
            Ok(text) if encoding::is_base58_alphabet(text) => Ok(text.to_string()),
            _ => Err(SnsError::malformed(
                record,
                &hex::encode(bytes),
                "content is not base58 text",
            )),
        },

        Encoding::EvmHex => Ok(format!("0x{}", encoding::encode_hex(bytes))),

        Encoding::Bech32(hrp) => encoding::encode_bech32(hrp, bytes).map_err(malformed),

        Encoding::DottedQuad => encoding::format_ipv4(bytes).map_err(malformed),

        Encoding::ColonHex => encoding::format_ipv6(bytes).map_err(malformed),

        Encoding::Utf8 | Encoding::PunycodeUtf8 => deserialize_text(bytes, record),
    }
}

fn fixed_width(record: Record) -> usize {
    record.width().unwrap_or_default()
}

fn serialize_evm(value: &str) -> Result<Vec<u8>> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| SnsError::InvalidEvmAddress(format!("{value}: missing 0x prefix")))?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SnsError::InvalidEvmAddress(format!(
            "{value}: expected 40 hex digits"
        )));
    }
    encoding::decode_hex(digits).map_err(|e| SnsError::InvalidEvmAddress(format!("{value}: {e}")))
}

fn deserialize_text(bytes: &[u8], record: Record) -> Result<String> {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let trimmed = &bytes[..end];
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let text = std::str::from_utf8(trimmed)
        .map_err(|e| SnsError::malformed(record, &hex::encode(trimmed), e.to_string()))?;

    match record.encoding() {
        Encoding::PunycodeUtf8 => punycode::decode(text)
            .map_err(|_| SnsError::malformed(record, text, "punycode decoding failed")),
        _ => Ok(text.to_string()),
    }
}

// ============================================================================
// V1 layout
// ============================================================================

/// Serialize a value for a V1 record account.
///
/// SOL records cannot go through here: their V1 payload embeds a signature, use
/// [`serialize_sol_record_v1`].
pub fn serialize_v1(value: &str, record: Record) -> Result<Vec<u8>> {
    if record == Record::Sol {
        return Err(SnsError::UnsupportedRecord(
            "SOL records embed a signature, use serialize_sol_record_v1".to_string(),
        ));
    }
    serialize(value, record)
}

/// 32 bytes of content followed by the 64-byte owner signature
pub fn serialize_sol_record_v1(content: &Pubkey, signature: &[u8; 64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(96);
    out.extend_from_slice(content.as_ref());
    out.extend_from_slice(signature);
    out
}

/// Deserialize V1 content. Fixed kinds read their width from the front of the
/// buffer (zero padding after it is ignored), text kinds are zero trimmed.
pub fn deserialize_v1(bytes: &[u8], record: Record) -> Result<String> {
    match record.width() {
        Some(width) if bytes.len() >= width => deserialize(&bytes[..width], record),
        Some(width) => Err(SnsError::InvalidRecordData {
            record,
            expected: width,
            actual: bytes.len(),
        }),
        None => deserialize_text(bytes, record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: &str, record: Record) {
        let bytes = serialize(value, record).unwrap();
        if let Some(width) = record.width() {
            assert_eq!(bytes.len(), width, "{record}");
        }
        assert_eq!(deserialize(&bytes, record).unwrap(), value, "{record}");
    }

    const KEY: &str = "HKKp49qGWXd639QsuH7JiLijfVW5UtCVY4s1n2HANwEA";
    const EVM: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    fn valid_value(record: Record) -> &'static str {
        match record {
            Record::Sol | Record::Shdw | Record::Background => KEY,
            Record::Eth | Record::Bsc | Record::Base => EVM,
            Record::Injective => "inj10e0525sfrf53yh2aljmm3sn9jq5njk7lwfmzjf",
            Record::Btc => "1A1zP1eP5QGefi2DMPTfTLSKNvGo4LQdSs",
            Record::Ltc => "LVg2kJoFNg45Nbpy53h7Fe1wKyeXVRhMH9",
            Record::Doge => "DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L",
            Record::Ipfs => "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            Record::Arwv => "HKKp49qGWXd639QsuH7JiLijfVW5UtCVY4s1n2HANwE",
            Record::A => "192.168.1.1",
            Record::AAAA => "2001:db8::1",
            Record::Url => "https://sns.id",
            Record::Email => "hello@sns.id",
            Record::Twitter => "@bonfida",
            Record::Discord => "bonfida#1234",
            Record::Github => "bonfida",
            Record::Reddit => "u/bonfida",
            Record::Telegram => "@bonfida_sns",
            Record::Pic => "https://sns.id/avatar.png",
            Record::Point => "bonfida.point",
            Record::Backpack => "bonfida",
            Record::Ipns => "k51qzi5uqu5dlvj2baxnqndepeb86cbk3ng7n3i46uzyxzyqj2xjonzllnv0v8",
            Record::Cname => "example.com",
            Record::Txt => "v=spf1 -all",
        }
    }

    /// A value the kind must refuse; text kinds accept any string
    fn invalid_value(record: Record) -> Option<&'static str> {
        match record {
            Record::Sol | Record::Shdw | Record::Background => Some("not-a-key"),
            Record::Eth | Record::Bsc | Record::Base => Some("7e5f4552091a69125d5dfcb7b8c2659029395bdf"),
            Record::Injective => Some("cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu"),
            // a 32-byte key is not a 25-byte payload
            Record::Btc | Record::Ltc | Record::Doge => Some(KEY),
            Record::Ipfs => Some("QmTooShort"),
            Record::Arwv => Some(KEY),
            Record::A => Some("192.168.1.256"),
            Record::AAAA => Some("1:2:3:4:5:6:7:8:9"),
            _ => None,
        }
    }

    #[test]
    fn test_round_trip_every_kind() {
        for record in Record::ALL {
            round_trip(valid_value(record), record);
        }
        round_trip("mañana.sol", Record::Txt);
    }

    #[test]
    fn test_every_fixed_width_kind_rejects_garbage() {
        for record in Record::ALL {
            match invalid_value(record) {
                Some(value) => assert!(serialize(value, record).is_err(), "{record} accepted {value}"),
                None => assert!(record.is_text(), "{record} has no rejection case"),
            }
        }
    }

    #[test]
    fn test_ipv4_bytes_exact() {
        assert_eq!(serialize("192.168.1.1", Record::A).unwrap(), vec![192, 168, 1, 1]);
        assert_eq!(deserialize(&[192, 168, 1, 1], Record::A).unwrap(), "192.168.1.1");
    }

    #[test]
    fn test_ipv6_canonical_compression() {
        let bytes = serialize("2001:0db8:0000:0000:0000:0000:0000:0001", Record::AAAA).unwrap();
        assert_eq!(deserialize(&bytes, Record::AAAA).unwrap(), "2001:db8::1");
    }

    #[test]
    fn test_rejections_are_typed() {
        assert!(matches!(
            serialize("7e5f4552091a69125d5dfcb7b8c2659029395bdf", Record::Eth),
            Err(SnsError::InvalidEvmAddress(_))
        ));
        assert!(matches!(
            serialize("0x7e5f45", Record::Bsc),
            Err(SnsError::InvalidEvmAddress(_))
        ));
        assert!(matches!(
            serialize("cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu", Record::Injective),
            Err(SnsError::InvalidInjectiveAddress(_))
        ));
        assert!(matches!(
            serialize("192.168.1.256", Record::A),
            Err(SnsError::InvalidARecord(_))
        ));
        assert!(matches!(
            serialize("1:2:3:4:5:6:7:8:9", Record::AAAA),
            Err(SnsError::InvalidAAAARecord(_))
        ));
        assert!(matches!(
            serialize("not-a-key", Record::Sol),
            Err(SnsError::MalformedInput { record: Record::Sol, .. })
        ));
        assert!(matches!(
            serialize("0OIl", Record::Btc),
            Err(SnsError::MalformedInput { record: Record::Btc, .. })
        ));
        assert!(matches!(
            serialize("QmTooShort", Record::Ipfs),
            Err(SnsError::MalformedInput { record: Record::Ipfs, .. })
        ));
        // 32-byte key is not a 25-byte BTC payload
        assert!(matches!(
            serialize("HKKp49qGWXd639QsuH7JiLijfVW5UtCVY4s1n2HANwEA", Record::Btc),
            Err(SnsError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_injective_wrong_payload_length() {
        let long = encoding::encode_bech32("inj", &[1u8; 32]).unwrap();
        assert!(matches!(
            serialize(&long, Record::Injective),
            Err(SnsError::InvalidInjectiveAddress(_))
        ));
    }

    #[test]
    fn test_text_trims_trailing_zeros() {
        assert_eq!(deserialize(b"bonfida\0\0\0", Record::Github).unwrap(), "bonfida");
        assert_eq!(deserialize(&[0u8; 16], Record::Url).unwrap(), "");
        assert_eq!(deserialize(&[], Record::Txt).unwrap(), "");
    }

    #[test]
    fn test_cname_is_punycode_on_chain() {
        let bytes = serialize("example.com", Record::Cname).unwrap();
        assert_eq!(bytes, b"example.com-");
    }

    #[test]
    fn test_fixed_width_length_mismatch() {
        assert!(matches!(
            deserialize(&[1, 2, 3], Record::A),
            Err(SnsError::InvalidRecordData { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_v1_paths() {
        assert!(matches!(
            serialize_v1("HKKp49qGWXd639QsuH7JiLijfVW5UtCVY4s1n2HANwEA", Record::Sol),
            Err(SnsError::UnsupportedRecord(_))
        ));
        assert_eq!(serialize_v1("10.0.0.1", Record::A).unwrap(), vec![10, 0, 0, 1]);

        let content = Pubkey::new_unique();
        let payload = serialize_sol_record_v1(&content, &[4u8; 64]);
        assert_eq!(payload.len(), 96);
        assert_eq!(deserialize_v1(&payload, Record::Sol).unwrap(), content.to_string());

        assert_eq!(deserialize_v1(&[10, 0, 0, 1, 0, 0, 0], Record::A).unwrap(), "10.0.0.1");
        assert_eq!(deserialize_v1(b"https://x.y\0\0", Record::Url).unwrap(), "https://x.y");
        assert!(deserialize_v1(&[10, 0], Record::A).is_err());
    }
}
