use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::keccak;
use anchor_lang::solana_program::secp256k1_recover::secp256k1_recover;

use crate::config;
use crate::errors::{Result, SnsError};
use crate::state::{RecordV2, Validation};

/// Why an authenticity check did not pass
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("no public key could be recovered from the signature")]
    RecoveryFailed,

    #[error("recovered signer {recovered} differs from expected {expected}")]
    SignerMismatch { recovered: String, expected: String },

    #[error("recovery id v={0} is not 27 or 28")]
    InvalidRecoveryId(u8),

    #[error("signature component {0} is zero")]
    ZeroComponent(&'static str),

    #[error("account is missing or empty")]
    MissingAccount,

    #[error("timestamp is {age}s old, max age is {max_age}s")]
    Stale { age: u64, max_age: u64 },

    #[error("expected {expected:?} validation, record uses {found}")]
    WrongValidation { expected: Validation, found: u16 },

    #[error("staleness id {found} is not the current owner {owner}")]
    OwnerMismatch { found: String, owner: String },

    #[error("RoA id {roa_id} does not match {expected}")]
    RoaMismatch { roa_id: String, expected: String },

    #[error("signature was not made by {signer}")]
    SignatureMismatch { signer: String },
}

/// Structured detail attached to a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationMetadata {
    /// Ethereum-style signer recovered from a signature
    EthereumSigner {
        public_key: [u8; 64],
        address: [u8; 20],
    },
    /// Timestamp read from an account and its age at check time
    Timestamp { timestamp: u64, age: u64 },
}

/// Outcome of one authenticity check
///
/// Expected failures of untrusted data land here; `Err` is reserved for
/// malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub metadata: Option<ValidationMetadata>,
    pub failure: Option<ValidationFailure>,
}

impl ValidationResult {
    pub fn valid(metadata: Option<ValidationMetadata>) -> Self {
        Self {
            valid: true,
            metadata,
            failure: None,
        }
    }

    pub fn invalid(failure: ValidationFailure) -> Self {
        Self {
            valid: false,
            metadata: None,
            failure: Some(failure),
        }
    }

    pub fn with_metadata(mut self, metadata: ValidationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Human-readable reason for a failed check
    pub fn reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

// ============================================================================
// Cross-chain (secp256k1 / Ethereum personal_sign)
// ============================================================================

pub const ETHEREUM_SIGNATURE_LEN: usize = 65;
const ETHEREUM_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)
pub fn ethereum_message_hash(message: &[u8]) -> [u8; 32] {
    let len = message.len().to_string();
    keccak::hashv(&[ETHEREUM_MESSAGE_PREFIX.as_bytes(), len.as_bytes(), message]).to_bytes()
}

/// Ethereum address of an uncompressed public key (x || y)
pub fn ethereum_address(public_key: &[u8; 64]) -> [u8; 20] {
    let hash = keccak::hash(public_key).to_bytes();
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Recover the signer of an Ethereum-style signature (r || s || v)
///
/// Zero r or s and v outside {27, 28} are rejected before recovery is
/// attempted. Only a signature of the wrong length is an `Err`.
pub fn recover_ethereum_signer(message: &[u8], signature: &[u8]) -> Result<ValidationResult> {
    if signature.len() != ETHEREUM_SIGNATURE_LEN {
        return Err(SnsError::MalformedSignature {
            expected: ETHEREUM_SIGNATURE_LEN,
            actual: signature.len(),
        });
    }

    let (r, rest) = signature.split_at(32);
    let (s, v) = rest.split_at(32);
    let v = v[0];

    if r.iter().all(|b| *b == 0) {
        return Ok(ValidationResult::invalid(ValidationFailure::ZeroComponent("r")));
    }
    if s.iter().all(|b| *b == 0) {
        return Ok(ValidationResult::invalid(ValidationFailure::ZeroComponent("s")));
    }
    if v != 27 && v != 28 {
        return Ok(ValidationResult::invalid(ValidationFailure::InvalidRecoveryId(v)));
    }

    let hash = ethereum_message_hash(message);
    let recovered = match secp256k1_recover(&hash, v - 27, &signature[..64]) {
        Ok(key) => key.to_bytes(),
        Err(e) => {
            tracing::debug!("secp256k1 recovery failed: {e:?}");
            return Ok(ValidationResult::invalid(ValidationFailure::RecoveryFailed));
        }
    };

    Ok(ValidationResult::valid(Some(ValidationMetadata::EthereumSigner {
        public_key: recovered,
        address: ethereum_address(&recovered),
    })))
}

/// Verify that `signature` over `message` was produced by `expected_address`
pub fn verify_ethereum_signature(
    message: &[u8],
    signature: &[u8],
    expected_address: &[u8; 20],
) -> Result<ValidationResult> {
    let recovered = recover_ethereum_signer(message, signature)?;

    let (public_key, address) = match &recovered.metadata {
        Some(ValidationMetadata::EthereumSigner {
            public_key,
            address,
        }) => (*public_key, *address),
        _ => return Ok(recovered),
    };

    if &address != expected_address {
        return Ok(ValidationResult::invalid(ValidationFailure::SignerMismatch {
            recovered: format!("0x{}", hex::encode(address)),
            expected: format!("0x{}", hex::encode(expected_address)),
        })
        .with_metadata(ValidationMetadata::EthereumSigner {
            public_key,
            address,
        }));
    }

    Ok(recovered)
}

// ============================================================================
// Staleness (timestamp based)
// ============================================================================

/// Where to find a timestamp in an account and how old it may be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessCheck {
    /// Byte offset of a little-endian u64 unix timestamp (seconds)
    pub offset: usize,
    pub max_age_secs: u64,
}

impl StalenessCheck {
    /// General record freshness window
    pub fn record(offset: usize) -> Self {
        Self {
            offset,
            max_age_secs: config::DEFAULT_RECORD_MAX_AGE_SECS,
        }
    }

    /// Price-oracle feed freshness window
    pub fn oracle(offset: usize) -> Self {
        Self {
            offset,
            max_age_secs: config::DEFAULT_ORACLE_MAX_AGE_SECS,
        }
    }

    /// Record freshness window taken from `config`
    pub fn record_from(config: &config::StalenessConfig, offset: usize) -> Self {
        Self::record(offset).with_max_age(config.record_max_age_secs)
    }

    /// Oracle freshness window taken from `config`
    pub fn oracle_from(config: &config::StalenessConfig, offset: usize) -> Self {
        Self::oracle(offset).with_max_age(config.oracle_max_age_secs)
    }

    pub fn with_max_age(mut self, max_age_secs: u64) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }
}

/// Check the timestamp embedded in `data` against `now`
///
/// Stale iff `now - timestamp > max_age`. A missing or empty account is always
/// stale. A non-empty account too short to hold the timestamp is an error.
pub fn check_timestamp(data: Option<&[u8]>, check: &StalenessCheck, now: i64) -> Result<ValidationResult> {
    let data = match data {
        Some(data) if !data.is_empty() => data,
        _ => return Ok(ValidationResult::invalid(ValidationFailure::MissingAccount)),
    };

    let window = check
        .offset
        .checked_add(8)
        .and_then(|end| data.get(check.offset..end));
    let Some(window) = window else {
        return Err(SnsError::TruncatedAccount {
            account: "timestamped",
            expected: check.offset.saturating_add(8),
            actual: data.len(),
        });
    };

    let mut raw = [0u8; 8];
    raw.copy_from_slice(window);
    let timestamp = u64::from_le_bytes(raw);

    let age = (i128::from(now) - i128::from(timestamp)).max(0);
    let age = u64::try_from(age).unwrap_or(u64::MAX);
    let metadata = ValidationMetadata::Timestamp { timestamp, age };

    if age > check.max_age_secs {
        return Ok(ValidationResult::invalid(ValidationFailure::Stale {
            age,
            max_age: check.max_age_secs,
        })
        .with_metadata(metadata));
    }
    Ok(ValidationResult::valid(Some(metadata)))
}

// ============================================================================
// V2 record proofs
// ============================================================================

/// A V2 record is fresh when it was written under Solana staleness validation by
/// the domain's current owner.
pub fn verify_record_staleness(record: &RecordV2, owner: &Pubkey) -> ValidationResult {
    if record.header.staleness_validation != Validation::Solana.as_u16() {
        return ValidationResult::invalid(ValidationFailure::WrongValidation {
            expected: Validation::Solana,
            found: record.header.staleness_validation,
        });
    }
    if record.staleness_id != owner.to_bytes() {
        return ValidationResult::invalid(ValidationFailure::OwnerMismatch {
            found: display_id(&record.staleness_id),
            owner: owner.to_string(),
        });
    }
    ValidationResult::valid(None)
}

/// Right of association: the record's RoA scheme is `expected` and its RoA id
/// equals `verifier` (or, when none is given, the record content itself).
pub fn verify_right_of_association(
    record: &RecordV2,
    expected: Validation,
    verifier: Option<&[u8]>,
) -> ValidationResult {
    if record.header.roa_validation != expected.as_u16() {
        return ValidationResult::invalid(ValidationFailure::WrongValidation {
            expected,
            found: record.header.roa_validation,
        });
    }

    let target = verifier.unwrap_or(&record.content);
    if record.roa_id.is_empty() || record.roa_id != target {
        return ValidationResult::invalid(ValidationFailure::RoaMismatch {
            roa_id: display_id(&record.roa_id),
            expected: display_id(target),
        });
    }
    ValidationResult::valid(None)
}

/// Render an id as an address when it is 32 bytes, hex otherwise
pub(crate) fn display_id(id: &[u8]) -> String {
    match <[u8; 32]>::try_from(id) {
        Ok(bytes) => Pubkey::new_from_array(bytes).to_string(),
        Err(_) => format!("0x{}", hex::encode(id)),
    }
}
