use std::time::Duration;

use anchor_lang::prelude::Pubkey;

use crate::errors::Result;
use crate::rpc::{with_timeout, AccountFilter, RpcClient};
use crate::{NAME_PROGRAM_ID, ROOT_DOMAIN_ACCOUNT};

/// Registry keys of every top-level `.sol` domain owned by `owner`
///
/// Matches registry accounts whose parent is the root domain (offset 0) and
/// whose owner is `owner` (offset 32). Tokenized domains are owned by the
/// tokenizer escrow and are not returned.
pub async fn get_domains_for_owner(
    rpc: &dyn RpcClient,
    owner: &Pubkey,
    timeout: Duration,
) -> Result<Vec<Pubkey>> {
    let filters = [
        AccountFilter::Memcmp {
            offset: 0,
            bytes: ROOT_DOMAIN_ACCOUNT.to_bytes().to_vec(),
        },
        AccountFilter::Memcmp {
            offset: 32,
            bytes: owner.to_bytes().to_vec(),
        },
    ];

    let accounts = with_timeout(timeout, rpc.get_program_accounts(&NAME_PROGRAM_ID, &filters)).await?;
    Ok(accounts.into_iter().map(|(key, _)| key).collect())
}
