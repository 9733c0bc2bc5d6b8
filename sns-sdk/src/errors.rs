use std::time::Duration;

use anchor_lang::prelude::Pubkey;

use crate::record::Record;

pub type Result<T> = std::result::Result<T, SnsError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnsError {
    // ------------------------------------------------------------------
    // Input errors
    // ------------------------------------------------------------------
    #[error("Unsupported record: {0}")]
    UnsupportedRecord(String),

    #[error("Invalid EVM address: {0}")]
    InvalidEvmAddress(String),

    #[error("Invalid Injective address: {0}")]
    InvalidInjectiveAddress(String),

    #[error("Invalid A record: {0}")]
    InvalidARecord(String),

    #[error("Invalid AAAA record: {0}")]
    InvalidAAAARecord(String),

    #[error("Malformed {record} value {value:?}: {reason}")]
    MalformedInput {
        record: Record,
        value: String,
        reason: String,
    },

    #[error("Invalid {record} record data - expected {expected} bytes, got {actual}")]
    InvalidRecordData {
        record: Record,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown record: {0}")]
    UnknownRecord(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed signature - expected {expected} bytes, got {actual}")]
    MalformedSignature { expected: usize, actual: usize },

    #[error("Malformed public key - expected {expected} bytes, got {actual}")]
    MalformedPublicKey { expected: usize, actual: usize },

    // ------------------------------------------------------------------
    // Validation failures
    // ------------------------------------------------------------------
    #[error("Invalid validation scheme: {0}")]
    InvalidValidation(String),

    #[error("Invalid right of association: {0}")]
    InvalidRoA(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Record malformed: {0}")]
    RecordMalformed(String),

    // ------------------------------------------------------------------
    // Account-state errors
    // ------------------------------------------------------------------
    #[error("Truncated {account} account - need {expected} bytes, got {actual}")]
    TruncatedAccount {
        account: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Domain does not exist: {0}")]
    DomainDoesNotExist(Pubkey),

    #[error("Could not find NFT owner for mint {0}")]
    CouldNotFindNftOwner(Pubkey),

    // ------------------------------------------------------------------
    // Policy errors
    // ------------------------------------------------------------------
    #[error("Domain owner {0} is a program-derived address and PDA owners are not allowed")]
    PdaOwnerNotAllowed(Pubkey),

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------
    #[error("RPC call timed out after {0:?}")]
    Timeout(Duration),

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl SnsError {
    /// Whether a caller may retry the whole call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SnsError::Timeout(_) | SnsError::Rpc(_))
    }

    pub(crate) fn malformed(record: Record, value: &str, reason: impl Into<String>) -> Self {
        SnsError::MalformedInput {
            record,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
