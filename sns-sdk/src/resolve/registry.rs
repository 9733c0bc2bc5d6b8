use std::time::Duration;

use tracing::debug;

use super::StepOutcome;
use crate::config::AllowPda;
use crate::errors::SnsError;
use crate::rpc::{with_timeout, RpcClient};
use crate::state::RegistryAccount;

/// Last resort: the registry owner
///
/// Wallet owners (on the ed25519 curve) are returned as-is. Program-derived
/// owners go through `allow_pda`.
pub async fn resolve_registry_owner(
    rpc: &dyn RpcClient,
    registry: &RegistryAccount,
    allow_pda: &AllowPda,
    timeout: Duration,
) -> StepOutcome {
    let owner = registry.owner;
    if owner.is_on_curve() {
        return StepOutcome::Resolved(owner);
    }
    debug!(%owner, ?allow_pda, "registry owner is off curve");

    let denied = StepOutcome::HardFailure(SnsError::PdaOwnerNotAllowed(owner));
    match allow_pda {
        AllowPda::Deny => denied,
        AllowPda::Any => StepOutcome::Resolved(owner),
        AllowPda::Existing | AllowPda::Programs(_) => {
            let account = match with_timeout(timeout, rpc.fetch_account(&owner)).await {
                Ok(account) => account,
                Err(err) => return StepOutcome::HardFailure(err),
            };
            match (allow_pda, account) {
                (AllowPda::Existing, Some(_)) => StepOutcome::Resolved(owner),
                (AllowPda::Programs(programs), Some(account)) if programs.contains(&account.owner) => {
                    StepOutcome::Resolved(owner)
                }
                _ => denied,
            }
        }
    }
}
