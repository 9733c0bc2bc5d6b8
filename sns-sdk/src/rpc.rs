//! Ledger access
//!
//! Everything the SDK reads comes through [`RpcClient`]. [`MemoryRpc`] serves a
//! fixed set of accounts loaded from a JSON snapshot.

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use anchor_spl::token::spl_token;
use async_trait::async_trait;
use futures::future::try_join_all;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::errors::{Result, SnsError};
use crate::state::TokenAccount;

/// Raw account as returned by the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountData {
    /// Program that owns the account
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

/// Server-side filter for `getProgramAccounts`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountFilter {
    Memcmp { offset: usize, bytes: Vec<u8> },
    DataSize(usize),
}

impl AccountFilter {
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            AccountFilter::Memcmp { offset, bytes } => offset
                .checked_add(bytes.len())
                .and_then(|end| data.get(*offset..end))
                .is_some_and(|window| window == bytes.as_slice()),
            AccountFilter::DataSize(size) => data.len() == *size,
        }
    }
}

/// Token account holding some amount of a mint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenHolder {
    pub address: Pubkey,
    pub amount: u64,
}

#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<AccountData>>;

    /// Results are in the order of `addresses`
    ///
    /// The default dispatches one `fetch_account` per address concurrently.
    /// Clients with a batched call should override it.
    async fn fetch_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<AccountData>>> {
        try_join_all(addresses.iter().map(|address| self.fetch_account(address))).await
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, AccountData)>>;

    /// Largest token accounts of `mint`, descending by amount
    async fn get_token_largest_holders(&self, mint: &Pubkey) -> Result<Vec<TokenHolder>>;
}

/// Bound a call by `duration`
pub async fn with_timeout<T, F>(duration: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(duration, call)
        .await
        .map_err(|_| SnsError::Timeout(duration))?
}

// ============================================================================
// Snapshot-backed client
// ============================================================================

/// Number of holders `getTokenLargestAccounts` returns
const LARGEST_HOLDERS_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub accounts: Vec<SnapshotAccount>,
}

/// One account in a snapshot file. Keys are base58, data is hex.
#[derive(Debug, Deserialize)]
pub struct SnapshotAccount {
    pub address: String,
    pub owner: String,
    #[serde(default)]
    pub data: String,
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| SnsError::InvalidConfig(format!("snapshot {field} {value:?}: {e}")))
}

#[derive(Default)]
pub struct MemoryRpc {
    accounts: RwLock<HashMap<Pubkey, AccountData>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MemoryRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let rpc = Self::new();
        for account in snapshot.accounts {
            let address = parse_pubkey("address", &account.address)?;
            let owner = parse_pubkey("owner", &account.owner)?;
            let data = hex::decode(account.data.trim_start_matches("0x")).map_err(|e| {
                SnsError::InvalidConfig(format!("snapshot data for {address}: {e}"))
            })?;
            rpc.insert(address, AccountData { owner, data });
        }
        Ok(rpc)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| SnsError::InvalidConfig(format!("snapshot: {e}")))?;
        Self::from_snapshot(snapshot)
    }

    /// Delay every call, used to exercise timeouts
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, address: Pubkey, account: AccountData) {
        self.accounts.write().insert(address, account);
    }

    pub fn remove(&self, address: &Pubkey) {
        self.accounts.write().remove(address);
    }

    /// Number of RPC round trips served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    async fn round_trip(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RpcClient for MemoryRpc {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<AccountData>> {
        self.round_trip().await;
        Ok(self.accounts.read().get(address).cloned())
    }

    async fn fetch_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<AccountData>>> {
        self.round_trip().await;
        let accounts = self.accounts.read();
        Ok(addresses.iter().map(|a| accounts.get(a).cloned()).collect())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, AccountData)>> {
        self.round_trip().await;
        let accounts = self.accounts.read();
        let mut matched: Vec<_> = accounts
            .iter()
            .filter(|(_, account)| account.owner == *program_id)
            .filter(|(_, account)| filters.iter().all(|f| f.matches(&account.data)))
            .map(|(address, account)| (*address, account.clone()))
            .collect();
        matched.sort_by_key(|(address, _)| *address);
        Ok(matched)
    }

    async fn get_token_largest_holders(&self, mint: &Pubkey) -> Result<Vec<TokenHolder>> {
        self.round_trip().await;
        let accounts = self.accounts.read();
        let mut holders: Vec<TokenHolder> = accounts
            .iter()
            .filter(|(_, account)| account.owner == spl_token::ID)
            .filter_map(|(address, account)| {
                let token = TokenAccount::decode(&account.data).ok()?;
                (token.mint == *mint).then_some(TokenHolder {
                    address: *address,
                    amount: token.amount,
                })
            })
            .collect();
        holders.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.address.cmp(&b.address)));
        holders.truncate(LARGEST_HOLDERS_LIMIT);
        Ok(holders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memcmp_filter() {
        let filter = AccountFilter::Memcmp {
            offset: 2,
            bytes: vec![7, 8],
        };
        assert!(filter.matches(&[0, 0, 7, 8, 9]));
        assert!(!filter.matches(&[0, 0, 7, 9]));
        assert!(!filter.matches(&[0, 0, 7]));
        assert!(AccountFilter::DataSize(3).matches(&[1, 2, 3]));

        let far = AccountFilter::Memcmp {
            offset: usize::MAX,
            bytes: vec![7],
        };
        assert!(!far.matches(&[7; 8]));
    }

    /// Client with only single-account lookups
    struct SlowClient {
        latency: Duration,
    }

    #[async_trait]
    impl RpcClient for SlowClient {
        async fn fetch_account(&self, address: &Pubkey) -> Result<Option<AccountData>> {
            tokio::time::sleep(self.latency).await;
            Ok(Some(AccountData {
                owner: *address,
                data: Vec::new(),
            }))
        }

        async fn get_program_accounts(
            &self,
            _program_id: &Pubkey,
            _filters: &[AccountFilter],
        ) -> Result<Vec<(Pubkey, AccountData)>> {
            Ok(Vec::new())
        }

        async fn get_token_largest_holders(&self, _mint: &Pubkey) -> Result<Vec<TokenHolder>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_default_fetch_accounts_is_concurrent() {
        let client = SlowClient {
            latency: Duration::from_millis(100),
        };
        let addresses: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();

        let started = tokio::time::Instant::now();
        let accounts = client.fetch_accounts(&addresses).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(250));

        let owners: Vec<Pubkey> = accounts.into_iter().map(|a| a.unwrap().owner).collect();
        assert_eq!(owners, addresses);
    }

    #[test]
    fn test_snapshot_parsing() {
        let address = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let json = format!(
            r#"{{"accounts": [{{"address": "{address}", "owner": "{owner}", "data": "0x0102ff"}}]}}"#
        );
        let rpc = MemoryRpc::from_json(&json).unwrap();
        let account = rpc.accounts.read().get(&address).cloned().unwrap();
        assert_eq!(account.owner, owner);
        assert_eq!(account.data, vec![1, 2, 0xff]);

        let bad = r#"{"accounts": [{"address": "nope", "owner": "nope"}]}"#;
        assert!(matches!(MemoryRpc::from_json(bad), Err(SnsError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_fetch_accounts_preserves_order() {
        let rpc = MemoryRpc::new();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        rpc.insert(a, AccountData { owner: Pubkey::default(), data: vec![1] });

        let accounts = rpc.fetch_accounts(&[b, a]).await.unwrap();
        assert_eq!(accounts[0], None);
        assert_eq!(accounts[1].as_ref().map(|a| a.data.clone()), Some(vec![1]));
        assert_eq!(rpc.calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let rpc = MemoryRpc::new().with_latency(Duration::from_millis(200));
        let address = Pubkey::new_unique();
        let result = with_timeout(Duration::from_millis(10), rpc.fetch_account(&address)).await;
        assert_eq!(result, Err(SnsError::Timeout(Duration::from_millis(10))));
    }
}
