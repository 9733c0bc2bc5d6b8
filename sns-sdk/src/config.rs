use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Deserializer};

use crate::errors::SnsError;

/// Max age of a general record timestamp (seconds)
pub const DEFAULT_RECORD_MAX_AGE_SECS: u64 = 300;

/// Max age of a price-oracle feed (seconds)
pub const DEFAULT_ORACLE_MAX_AGE_SECS: u64 = 60;

/// Number of staleness checks dispatched concurrently per chunk
pub const DEFAULT_BATCH_CHUNK_SIZE: usize = 10;

/// Per-RPC-call timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// What to do when a domain's registry owner is a program-derived address
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowPda {
    /// Reject PDA owners
    #[default]
    Deny,
    /// Accept any PDA owner as-is
    Any,
    /// Accept a PDA owner whose account exists on chain
    Existing,
    /// Accept a PDA owner whose account exists and is owned by one of these programs
    Programs(#[serde(deserialize_with = "deserialize_pubkey_set")] HashSet<Pubkey>),
}

impl FromStr for AllowPda {
    type Err = SnsError;

    /// `deny`/`false`, `any`, `existing`/`true`, or a comma separated list of
    /// program ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" | "false" | "" => Ok(AllowPda::Deny),
            "any" => Ok(AllowPda::Any),
            "existing" | "true" => Ok(AllowPda::Existing),
            _ => s
                .split(',')
                .map(|id| {
                    Pubkey::from_str(id.trim())
                        .map_err(|_| SnsError::InvalidConfig(format!("invalid program id in PDA policy: {id}")))
                })
                .collect::<Result<HashSet<_>, _>>()
                .map(AllowPda::Programs),
        }
    }
}

fn deserialize_pubkey_set<'de, D>(deserializer: D) -> Result<HashSet<Pubkey>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Vec::<String>::deserialize(deserializer)?;
    ids.iter()
        .map(|id| Pubkey::from_str(id).map_err(serde::de::Error::custom))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    pub record_max_age_secs: u64,
    pub oracle_max_age_secs: u64,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            record_max_age_secs: DEFAULT_RECORD_MAX_AGE_SECS,
            oracle_max_age_secs: DEFAULT_ORACLE_MAX_AGE_SECS,
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub timeout_ms: u64,
    pub allow_pda: AllowPda,
    pub staleness: StalenessConfig,
    pub batch_chunk_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            allow_pda: AllowPda::Deny,
            staleness: StalenessConfig::default(),
            batch_chunk_size: DEFAULT_BATCH_CHUNK_SIZE,
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_allow_pda(mut self, allow_pda: AllowPda) -> Self {
        self.allow_pda = allow_pda;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }
}
