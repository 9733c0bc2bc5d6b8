//! Domain ownership resolution
//!
//! Ownership is settled by the first step that resolves, in this order:
//! 1. tokenized domain: the holder of the domain NFT
//! 2. V2 SOL record, when both its staleness and RoA proofs hold
//! 3. V1 SOL record, when signed by the registry owner
//! 4. the registry owner itself, subject to the PDA policy

pub mod nft;
pub mod registry;
pub mod sol_record;

use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use tracing::{debug, warn};

use crate::cache::OwnerCache;
use crate::config::ResolverConfig;
use crate::derivation::{get_domain_key, DomainAccounts};
use crate::errors::{Result, SnsError};
use crate::rpc::{with_timeout, AccountData, RpcClient};
use crate::state::RegistryAccount;

pub use nft::resolve_nft_owner;
pub use registry::resolve_registry_owner;
pub use sol_record::{resolve_sol_record_v1, resolve_sol_record_v2};

/// Result of one resolution step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step settled ownership
    Resolved(Pubkey),
    /// The step does not apply; carries the rejection when there was something
    /// to reject
    NotApplicable(Option<SnsError>),
    /// The whole resolution fails
    HardFailure(SnsError),
}

impl StepOutcome {
    pub(crate) fn skip() -> Self {
        StepOutcome::NotApplicable(None)
    }

    pub(crate) fn reject(err: SnsError) -> Self {
        StepOutcome::NotApplicable(Some(err))
    }
}

pub struct Resolver {
    rpc: Arc<dyn RpcClient>,
    config: ResolverConfig,
    cache: Option<Arc<dyn OwnerCache>>,
}

impl Resolver {
    pub fn new(rpc: Arc<dyn RpcClient>) -> Self {
        Self {
            rpc,
            config: ResolverConfig::default(),
            cache: None,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn OwnerCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a domain name such as `bonfida.sol` or `dex.bonfida`
    pub async fn resolve(&self, domain: &str) -> Result<Pubkey> {
        let domain_key = get_domain_key(domain)?;
        self.resolve_owner(&domain_key).await
    }

    /// Resolve the owner of a domain registry account
    pub async fn resolve_owner(&self, domain_key: &Pubkey) -> Result<Pubkey> {
        if let Some(owner) = self.cache.as_ref().and_then(|c| c.get(domain_key)) {
            debug!(domain = %domain_key, %owner, "owner served from cache");
            return Ok(owner);
        }

        let owner = self.resolve_uncached(domain_key).await?;
        if let Some(cache) = &self.cache {
            cache.insert(*domain_key, owner);
        }
        Ok(owner)
    }

    async fn resolve_uncached(&self, domain_key: &Pubkey) -> Result<Pubkey> {
        let timeout = self.config.timeout();
        let keys = DomainAccounts::derive(domain_key);

        let fetched = with_timeout(timeout, self.rpc.fetch_accounts(&keys.as_array())).await?;
        let [registry, nft_record, sol_v1, sol_v2] = into_four(fetched)?;

        let registry_data = registry.ok_or_else(|| {
            warn!(domain = %domain_key, "domain registry not found");
            SnsError::DomainDoesNotExist(*domain_key)
        })?;
        let registry = RegistryAccount::decode(&registry_data.data)?;

        let outcome =
            resolve_nft_owner(self.rpc.as_ref(), nft_record.as_ref(), &keys.nft_record, timeout).await;
        if let Some(owner) = settle("nft", domain_key, outcome)? {
            return Ok(owner);
        }

        let outcome = resolve_sol_record_v2(sol_v2.as_ref(), &registry);
        if let Some(owner) = settle("sol_record_v2", domain_key, outcome)? {
            return Ok(owner);
        }

        let outcome = resolve_sol_record_v1(sol_v1.as_ref(), &keys.sol_record_v1, &registry);
        if let Some(owner) = settle("sol_record_v1", domain_key, outcome)? {
            return Ok(owner);
        }

        let outcome =
            resolve_registry_owner(self.rpc.as_ref(), &registry, &self.config.allow_pda, timeout).await;
        match settle("registry", domain_key, outcome)? {
            Some(owner) => Ok(owner),
            // the registry step always resolves or fails
            None => Err(SnsError::DomainDoesNotExist(*domain_key)),
        }
    }
}

fn into_four(accounts: Vec<Option<AccountData>>) -> Result<[Option<AccountData>; 4]> {
    accounts
        .try_into()
        .map_err(|v: Vec<_>| SnsError::Rpc(format!("expected 4 accounts, got {}", v.len())))
}

fn settle(step: &'static str, domain: &Pubkey, outcome: StepOutcome) -> Result<Option<Pubkey>> {
    match outcome {
        StepOutcome::Resolved(owner) => {
            debug!(step, %domain, %owner, "resolved");
            Ok(Some(owner))
        }
        StepOutcome::NotApplicable(None) => {
            debug!(step, %domain, "not applicable");
            Ok(None)
        }
        StepOutcome::NotApplicable(Some(reason)) => {
            debug!(step, %domain, %reason, "falling through");
            Ok(None)
        }
        StepOutcome::HardFailure(err) => {
            warn!(step, %domain, error = %err, "resolution failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle() {
        let domain = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        assert_eq!(settle("t", &domain, StepOutcome::Resolved(owner)), Ok(Some(owner)));
        assert_eq!(settle("t", &domain, StepOutcome::skip()), Ok(None));
        assert_eq!(
            settle("t", &domain, StepOutcome::reject(SnsError::InvalidRoA("x".into()))),
            Ok(None)
        );
        assert_eq!(
            settle("t", &domain, StepOutcome::HardFailure(SnsError::PdaOwnerNotAllowed(owner))),
            Err(SnsError::PdaOwnerNotAllowed(owner))
        );
    }

    #[test]
    fn test_into_four_rejects_short_batches() {
        assert!(into_four(vec![None, None, None, None]).is_ok());
        assert!(matches!(into_four(vec![None]), Err(SnsError::Rpc(_))));
    }
}
