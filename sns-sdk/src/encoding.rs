//! Text <-> byte codecs shared by the record codec and the account decoders.
//!
//! Every function here is pure and knows nothing about record kinds; the
//! codec layer maps [`EncodingError`] onto the record-specific error types.

use bech32::{FromBase32, ToBase32, Variant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid bech32: {0}")]
    InvalidBech32(String),

    #[error("wrong human-readable part - expected {expected:?}, got {actual:?}")]
    WrongHrp { expected: String, actual: String },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid IPv4 address: {0}")]
    InvalidIpv4(String),

    #[error("invalid IPv6 address: {0}")]
    InvalidIpv6(String),
}

pub type EncodingResult<T> = std::result::Result<T, EncodingError>;

// ============================================================================
// Base58 / hex
// ============================================================================

pub fn decode_base58(text: &str) -> EncodingResult<Vec<u8>> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| EncodingError::InvalidBase58(e.to_string()))
}

/// Decode base58 text that must produce exactly `width` bytes.
pub fn decode_base58_fixed(text: &str, width: usize) -> EncodingResult<Vec<u8>> {
    let bytes = decode_base58(text)?;
    ensure_len(&bytes, width)?;
    Ok(bytes)
}

pub fn encode_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// True when every character belongs to the bitcoin base58 alphabet.
pub fn is_base58_alphabet(text: &str) -> bool {
    text.bytes().all(|b| {
        b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l')
    })
}

pub fn decode_hex(text: &str) -> EncodingResult<Vec<u8>> {
    hex::decode(text).map_err(|e| EncodingError::InvalidHex(e.to_string()))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

fn ensure_len(bytes: &[u8], expected: usize) -> EncodingResult<()> {
    if bytes.len() != expected {
        return Err(EncodingError::InvalidLength {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Bech32
// ============================================================================

/// Decode a bech32 string with the expected HRP into its 8-bit payload.
///
/// The 5-bit groups are regrouped into bytes without padding; leftover bits
/// that are not zero make the input invalid.
pub fn decode_bech32(text: &str, expected_hrp: &str) -> EncodingResult<Vec<u8>> {
    let (hrp, data, variant) =
        bech32::decode(text).map_err(|e| EncodingError::InvalidBech32(e.to_string()))?;
    if hrp != expected_hrp {
        return Err(EncodingError::WrongHrp {
            expected: expected_hrp.to_string(),
            actual: hrp,
        });
    }
    if variant != Variant::Bech32 {
        return Err(EncodingError::InvalidBech32(
            "bech32m checksum where bech32 was expected".to_string(),
        ));
    }
    Vec::<u8>::from_base32(&data).map_err(|e| EncodingError::InvalidBech32(e.to_string()))
}

/// Encode bytes as bech32, padding the final 5-bit group with zeros.
pub fn encode_bech32(hrp: &str, bytes: &[u8]) -> EncodingResult<String> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| EncodingError::InvalidBech32(e.to_string()))
}

// ============================================================================
// IPv4
// ============================================================================

/// Parse a dotted quad. Octets must be plain decimal 0-255 without leading
/// zeros so that formatting the bytes gives back the same text.
pub fn parse_ipv4(text: &str) -> EncodingResult<[u8; 4]> {
    let invalid = || EncodingError::InvalidIpv4(text.to_string());

    let mut out = [0u8; 4];
    let mut parts = text.split('.');
    for slot in out.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty()
            || part.len() > 3
            || !part.bytes().all(|b| b.is_ascii_digit())
            || (part.len() > 1 && part.starts_with('0'))
        {
            return Err(invalid());
        }
        *slot = part.parse::<u8>().map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(out)
}

pub fn format_ipv4(bytes: &[u8]) -> EncodingResult<String> {
    ensure_len(bytes, 4)?;
    Ok(format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]))
}

// ============================================================================
// IPv6
// ============================================================================

const IPV6_GROUPS: usize = 8;

fn parse_groups(section: &str, original: &str) -> EncodingResult<Vec<u16>> {
    if section.is_empty() {
        return Ok(Vec::new());
    }
    section
        .split(':')
        .map(|group| {
            if group.is_empty()
                || group.len() > 4
                || !group.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(EncodingError::InvalidIpv6(original.to_string()));
            }
            u16::from_str_radix(group, 16)
                .map_err(|_| EncodingError::InvalidIpv6(original.to_string()))
        })
        .collect()
}

/// Parse colon-hex text into 16 bytes, expanding a single `::` into
/// `8 - explicit_groups` zero groups. `::` must stand for at least one group.
pub fn parse_ipv6(text: &str) -> EncodingResult<[u8; 16]> {
    let invalid = || EncodingError::InvalidIpv6(text.to_string());

    let groups: Vec<u16> = match text.find("::") {
        Some(idx) => {
            let (head, tail) = (&text[..idx], &text[idx + 2..]);
            if tail.contains("::") {
                return Err(invalid());
            }
            let head = parse_groups(head, text)?;
            let tail = parse_groups(tail, text)?;
            let explicit = head.len() + tail.len();
            let fill = IPV6_GROUPS
                .checked_sub(explicit)
                .filter(|fill| *fill > 0)
                .ok_or_else(invalid)?;

            let mut all = head;
            all.extend(std::iter::repeat(0u16).take(fill));
            all.extend(tail);
            all
        }
        None => parse_groups(text, text)?,
    };

    if groups.len() != IPV6_GROUPS {
        return Err(invalid());
    }

    let mut out = [0u8; 16];
    for (chunk, group) in out.chunks_exact_mut(2).zip(groups) {
        chunk.copy_from_slice(&group.to_be_bytes());
    }
    Ok(out)
}

/// Format 16 bytes as canonical colon-hex: lowercase, no leading zeros, and the
/// longest run (at least two) of zero groups collapsed to `::`, leftmost on ties.
pub fn format_ipv6(bytes: &[u8]) -> EncodingResult<String> {
    ensure_len(bytes, 16)?;

    let groups: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();

    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < groups.len() {
        if groups[i] != 0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < groups.len() && groups[i] == 0 {
            i += 1;
        }
        let len = i - start;
        if len >= 2 && best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
    }

    let hex = |gs: &[u16]| {
        gs.iter()
            .map(|g| format!("{g:x}"))
            .collect::<Vec<_>>()
            .join(":")
    };

    Ok(match best {
        Some((start, len)) => format!(
            "{}::{}",
            hex(&groups[..start]),
            hex(&groups[start + len..])
        ),
        None => hex(&groups),
    })
}
