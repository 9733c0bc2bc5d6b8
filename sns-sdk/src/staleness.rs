use std::collections::HashMap;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use futures::future::join_all;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::errors::Result;
use crate::rpc::{with_timeout, RpcClient};
use crate::verification::{check_timestamp, StalenessCheck, ValidationResult};

/// Fetch `address` and check the timestamp it carries
pub async fn check_staleness(
    rpc: &dyn RpcClient,
    address: &Pubkey,
    check: &StalenessCheck,
    now: i64,
    timeout: Duration,
) -> Result<ValidationResult> {
    let account = with_timeout(timeout, rpc.fetch_account(address)).await?;
    let result = check_timestamp(account.as_ref().map(|a| a.data.as_slice()), check, now)?;

    if let Some(reason) = result.reason() {
        debug!(%address, %reason, "stale account");
    }
    Ok(result)
}

/// Check many accounts, `batch_chunk_size` at a time
///
/// Checks within a chunk run concurrently; a failure for one address never
/// affects the others.
pub async fn check_staleness_batch(
    rpc: &dyn RpcClient,
    addresses: &[Pubkey],
    check: &StalenessCheck,
    now: i64,
    config: &ResolverConfig,
) -> HashMap<Pubkey, Result<ValidationResult>> {
    let timeout = config.timeout();
    let mut results = HashMap::with_capacity(addresses.len());

    for chunk in addresses.chunks(config.batch_chunk_size.max(1)) {
        let checks = chunk
            .iter()
            .map(|address| check_staleness(rpc, address, check, now, timeout));
        let outcomes = join_all(checks).await;
        results.extend(chunk.iter().copied().zip(outcomes));
    }
    results
}
