//! Record retrieval for a domain

use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use tracing::debug;

use crate::codec::{deserialize, deserialize_v1};
use crate::derivation::{get_domain_key, get_record_v1_key, get_record_v2_key};
use crate::ed25519_utils::check_sol_record;
use crate::errors::{Result, SnsError};
use crate::record::Record;
use crate::rpc::{with_timeout, AccountData, RpcClient};
use crate::state::{RecordV1, RecordV2, RegistryAccount, Validation};
use crate::verification::{
    verify_record_staleness, verify_right_of_association, ValidationFailure, ValidationResult,
};

/// A V1 record and its decoded value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordV1Entry {
    pub key: Pubkey,
    pub record: RecordV1,
    pub value: String,
    /// Owner signature check, present for SOL records only
    pub signature: Option<ValidationResult>,
}

/// Which proofs to check when reading a V2 record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    pub staleness: bool,
    pub roa: bool,
}

impl VerifyOptions {
    pub fn all() -> Self {
        Self {
            staleness: true,
            roa: true,
        }
    }
}

/// A V2 record, its decoded value and any proofs that were checked
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordV2Entry {
    pub key: Pubkey,
    pub record: RecordV2,
    pub value: String,
    pub staleness: Option<ValidationResult>,
    pub roa: Option<ValidationResult>,
}

/// Scheme a record's right of association is proven with, if it has one
pub fn roa_validation(record: Record) -> Option<Validation> {
    match record {
        Record::Sol => Some(Validation::Solana),
        Record::Eth | Record::Bsc | Record::Base | Record::Injective => Some(Validation::Ethereum),
        _ => None,
    }
}

fn registry_of(domain_key: &Pubkey, account: Option<AccountData>) -> Result<RegistryAccount> {
    let account = account.ok_or(SnsError::DomainDoesNotExist(*domain_key))?;
    RegistryAccount::decode(&account.data)
}

fn non_empty(account: Option<AccountData>) -> Option<AccountData> {
    account.filter(|a| !a.data.is_empty())
}

/// Read the V1 record `record` of `domain`
///
/// SOL records carry the result of checking their signature against the
/// domain owner in [`RecordV1Entry::signature`].
pub async fn get_record_v1(
    rpc: &dyn RpcClient,
    domain: &str,
    record: Record,
    timeout: Duration,
) -> Result<Option<RecordV1Entry>> {
    let domain_key = get_domain_key(domain)?;
    let key = get_record_v1_key(&domain_key, record);

    let mut accounts = with_timeout(timeout, rpc.fetch_accounts(&[domain_key, key])).await?;
    let record_account = non_empty(accounts.pop().flatten());
    let registry = registry_of(&domain_key, accounts.pop().flatten())?;

    let Some(account) = record_account else {
        debug!(%domain, %record, "no V1 record");
        return Ok(None);
    };
    let decoded = RecordV1::decode(&account.data, record)?;

    let signature = if record == Record::Sol {
        let result = if check_sol_record(&decoded, &key, &registry.owner)? {
            ValidationResult::valid(None)
        } else {
            ValidationResult::invalid(ValidationFailure::SignatureMismatch {
                signer: registry.owner.to_string(),
            })
        };
        if !result.valid {
            debug!(%domain, owner = %registry.owner, "SOL record not signed by owner");
        }
        Some(result)
    } else {
        None
    };

    let value = deserialize_v1(&decoded.content, record)?;
    Ok(Some(RecordV1Entry {
        key,
        record: decoded,
        value,
        signature,
    }))
}

/// Read the V2 record `record` of `domain`, checking the proofs asked for
///
/// RoA is only checked for records that have a proof scheme (see
/// [`roa_validation`]).
pub async fn get_record_v2(
    rpc: &dyn RpcClient,
    domain: &str,
    record: Record,
    verify: VerifyOptions,
    timeout: Duration,
) -> Result<Option<RecordV2Entry>> {
    let domain_key = get_domain_key(domain)?;
    let key = get_record_v2_key(&domain_key, record);

    let mut accounts = with_timeout(timeout, rpc.fetch_accounts(&[domain_key, key])).await?;
    let record_account = non_empty(accounts.pop().flatten());
    let registry = registry_of(&domain_key, accounts.pop().flatten())?;

    let Some(account) = record_account else {
        debug!(%domain, %record, "no V2 record");
        return Ok(None);
    };
    let decoded = RecordV2::decode(&account.data)?;
    let value = deserialize(decoded.require_content()?, record)?;

    let staleness = verify
        .staleness
        .then(|| verify_record_staleness(&decoded, &registry.owner));
    let roa = match roa_validation(record) {
        Some(expected) if verify.roa => Some(verify_right_of_association(&decoded, expected, None)),
        _ => None,
    };

    Ok(Some(RecordV2Entry {
        key,
        record: decoded,
        value,
        staleness,
        roa,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serialize;
    use crate::rpc::MemoryRpc;
    use crate::ROOT_DOMAIN_ACCOUNT;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn registry(owner: Pubkey) -> RegistryAccount {
        RegistryAccount {
            parent_name: ROOT_DOMAIN_ACCOUNT,
            owner,
            class: None,
            data: Vec::new(),
        }
    }

    fn insert_domain(rpc: &MemoryRpc, domain: &str, owner: Pubkey) -> Pubkey {
        let key = get_domain_key(domain).unwrap();
        let mut data = Vec::new();
        data.extend_from_slice(ROOT_DOMAIN_ACCOUNT.as_ref());
        data.extend_from_slice(owner.as_ref());
        data.extend_from_slice(&[0u8; 32]);
        rpc.insert(key, AccountData { owner: crate::NAME_PROGRAM_ID, data });
        key
    }

    #[tokio::test]
    async fn test_get_record_v2_with_proofs() {
        let rpc = MemoryRpc::new();
        let owner = Pubkey::new_unique();
        let domain_key = insert_domain(&rpc, "bonfida", owner);

        let address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";
        let content = serialize(address, Record::Eth).unwrap();
        let data = RecordV2::encode(
            &registry(owner),
            Validation::Solana,
            owner.as_ref(),
            Validation::Ethereum,
            &content,
            &content,
        );
        rpc.insert(
            get_record_v2_key(&domain_key, Record::Eth),
            AccountData { owner: crate::SNS_RECORDS_ID, data },
        );

        let entry = get_record_v2(&rpc, "bonfida.sol", Record::Eth, VerifyOptions::all(), TIMEOUT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.value, address);
        assert!(entry.staleness.unwrap().valid);
        assert!(entry.roa.unwrap().valid);

        // nothing was written for URL
        let none = get_record_v2(&rpc, "bonfida", Record::Url, VerifyOptions::all(), TIMEOUT)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_get_record_v2_reports_stale_record() {
        let rpc = MemoryRpc::new();
        let owner = Pubkey::new_unique();
        let domain_key = insert_domain(&rpc, "bonfida", owner);

        let content = serialize("https://sns.id", Record::Url).unwrap();
        let previous = Pubkey::new_unique();
        let data = RecordV2::encode(
            &registry(previous),
            Validation::Solana,
            previous.as_ref(),
            Validation::None,
            &[],
            &content,
        );
        rpc.insert(
            get_record_v2_key(&domain_key, Record::Url),
            AccountData { owner: crate::SNS_RECORDS_ID, data },
        );

        let entry = get_record_v2(&rpc, "bonfida", Record::Url, VerifyOptions::all(), TIMEOUT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.value, "https://sns.id");
        assert!(!entry.staleness.unwrap().valid);
        assert_eq!(entry.roa, None);
    }

    #[tokio::test]
    async fn test_get_record_v1() {
        let rpc = MemoryRpc::new();
        let owner = Pubkey::new_unique();
        let domain_key = insert_domain(&rpc, "bonfida", owner);

        let mut data = vec![0u8; RegistryAccount::LEN];
        data.extend_from_slice(&serialize("192.168.0.1", Record::A).unwrap());
        rpc.insert(
            get_record_v1_key(&domain_key, Record::A),
            AccountData { owner: crate::NAME_PROGRAM_ID, data },
        );

        let entry = get_record_v1(&rpc, "bonfida", Record::A, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(entry.value, "192.168.0.1");
        assert_eq!(entry.signature, None);

        let missing = get_record_v1(&rpc, "unknown", Record::A, TIMEOUT).await;
        assert!(matches!(missing, Err(SnsError::DomainDoesNotExist(_))));
    }

    #[tokio::test]
    async fn test_get_record_v1_reports_unsigned_sol_record() {
        let rpc = MemoryRpc::new();
        let owner = Pubkey::new_unique();
        let domain_key = insert_domain(&rpc, "bonfida", owner);

        let target = Pubkey::new_unique();
        let mut data = vec![0u8; RegistryAccount::LEN];
        data.extend_from_slice(target.as_ref());
        data.extend_from_slice(&[1u8; 64]);
        rpc.insert(
            get_record_v1_key(&domain_key, Record::Sol),
            AccountData { owner: crate::NAME_PROGRAM_ID, data },
        );

        let entry = get_record_v1(&rpc, "bonfida", Record::Sol, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(entry.value, target.to_string());
        let signature = entry.signature.unwrap();
        assert!(!signature.valid);
        assert_eq!(
            signature.failure,
            Some(ValidationFailure::SignatureMismatch { signer: owner.to_string() })
        );
    }

    #[tokio::test]
    async fn test_get_record_v1_accepts_owner_signed_sol_record() {
        use crate::codec::serialize_sol_record_v1;
        use crate::ed25519_utils::create_sol_record_message;
        use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer};

        let secret = SecretKey::from_bytes(&[3u8; 32]).unwrap();
        let public = PublicKey::from(&secret);
        let keys = Keypair { secret, public };
        let owner = Pubkey::new_from_array(public.to_bytes());

        let rpc = MemoryRpc::new();
        let domain_key = insert_domain(&rpc, "bonfida", owner);
        let key = get_record_v1_key(&domain_key, Record::Sol);
        let target = Pubkey::new_unique();
        let signature = keys.sign(&create_sol_record_message(target.as_ref(), &key)).to_bytes();

        let mut data = vec![0u8; RegistryAccount::LEN];
        data.extend_from_slice(&serialize_sol_record_v1(&target, &signature));
        rpc.insert(key, AccountData { owner: crate::NAME_PROGRAM_ID, data });

        let entry = get_record_v1(&rpc, "bonfida", Record::Sol, TIMEOUT).await.unwrap().unwrap();
        assert!(entry.signature.unwrap().valid);
    }
}
