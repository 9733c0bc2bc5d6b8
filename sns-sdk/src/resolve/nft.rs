use std::time::Duration;

use anchor_lang::prelude::Pubkey;

use super::StepOutcome;
use crate::errors::SnsError;
use crate::rpc::{with_timeout, AccountData, RpcClient};
use crate::state::{NftRecord, TokenAccount};
use crate::NAME_TOKENIZER_ID;

/// Owner of a tokenized domain: the single wallet holding its NFT
///
/// Applies only when the NFT record exists and is active. From then on every
/// problem is a hard failure: the registry owner of a tokenized domain is the
/// tokenizer's escrow.
pub async fn resolve_nft_owner(
    rpc: &dyn RpcClient,
    nft_record: Option<&AccountData>,
    nft_record_key: &Pubkey,
    timeout: Duration,
) -> StepOutcome {
    let Some(account) = nft_record.filter(|a| !a.data.is_empty()) else {
        return StepOutcome::skip();
    };
    if account.owner != NAME_TOKENIZER_ID {
        return StepOutcome::reject(SnsError::RecordMalformed(format!(
            "NFT record {nft_record_key} is owned by {}, not the name tokenizer",
            account.owner
        )));
    }

    let record = match NftRecord::decode(&account.data) {
        Ok(record) => record,
        Err(err) => return StepOutcome::HardFailure(err),
    };
    if !record.is_active() {
        return StepOutcome::skip();
    }

    match find_holder(rpc, &record.nft_mint, timeout).await {
        Ok(owner) => StepOutcome::Resolved(owner),
        Err(err) => StepOutcome::HardFailure(err),
    }
}

async fn find_holder(rpc: &dyn RpcClient, mint: &Pubkey, timeout: Duration) -> crate::Result<Pubkey> {
    let holders = with_timeout(timeout, rpc.get_token_largest_holders(mint)).await?;

    let mut holding_one = holders.iter().filter(|h| h.amount == 1);
    let (Some(holder), None) = (holding_one.next(), holding_one.next()) else {
        return Err(SnsError::CouldNotFindNftOwner(*mint));
    };

    let account = with_timeout(timeout, rpc.fetch_account(&holder.address))
        .await?
        .ok_or(SnsError::CouldNotFindNftOwner(*mint))?;
    let token = TokenAccount::decode(&account.data)?;

    if token.mint != *mint || token.amount != 1 {
        return Err(SnsError::CouldNotFindNftOwner(*mint));
    }
    Ok(token.owner)
}
