use anchor_lang::prelude::Pubkey;
use sha2::{Digest, Sha256};

use crate::errors::{Result, SnsError};
use crate::record::Record;
use crate::{HASH_PREFIX, NAME_PROGRAM_ID, NAME_TOKENIZER_ID, ROOT_DOMAIN_ACCOUNT, SNS_RECORDS_ID};

/// Seed prefixes that separate subdomains and record generations
const SUBDOMAIN_PREFIX: &str = "\x00";
const RECORD_V1_PREFIX: &str = "\x01";
const RECORD_V2_PREFIX: &str = "\x02";

/// sha256(HASH_PREFIX || name)
pub fn get_hashed_name(name: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(HASH_PREFIX.as_bytes());
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

/// Name registry address for a hashed name under an optional class and parent
pub fn get_name_account_key(
    hashed_name: &[u8; 32],
    class: Option<&Pubkey>,
    parent: Option<&Pubkey>,
) -> Pubkey {
    let class = class.copied().unwrap_or_default();
    let parent = parent.copied().unwrap_or_default();
    let (key, _bump) = Pubkey::find_program_address(
        &[hashed_name, class.as_ref(), parent.as_ref()],
        &NAME_PROGRAM_ID,
    );
    key
}

/// Central state of the records program, used as the class of V2 records
pub fn get_records_central_state() -> Pubkey {
    Pubkey::find_program_address(&[SNS_RECORDS_ID.as_ref()], &SNS_RECORDS_ID).0
}

fn child_key(prefix: &str, name: &str, parent: &Pubkey, class: Option<&Pubkey>) -> Pubkey {
    let hashed = get_hashed_name(&format!("{prefix}{name}"));
    get_name_account_key(&hashed, class, Some(parent))
}

/// Registry key of a `.sol` domain or one-level subdomain
///
/// Accepts `name`, `name.sol`, `sub.name` and `sub.name.sol`.
pub fn get_domain_key(domain: &str) -> Result<Pubkey> {
    let trimmed = domain.strip_suffix(".sol").unwrap_or(domain);
    let labels: Vec<&str> = trimmed.split('.').collect();

    if labels.iter().any(|l| l.is_empty()) {
        return Err(SnsError::InvalidDomain(domain.to_string()));
    }

    match labels.as_slice() {
        [name] => Ok(get_name_account_key(
            &get_hashed_name(name),
            None,
            Some(&ROOT_DOMAIN_ACCOUNT),
        )),
        [sub, name] => {
            let parent = get_name_account_key(&get_hashed_name(name), None, Some(&ROOT_DOMAIN_ACCOUNT));
            Ok(child_key(SUBDOMAIN_PREFIX, sub, &parent, None))
        }
        _ => Err(SnsError::InvalidDomain(domain.to_string())),
    }
}

/// V1 record key: `\x01 || record` under the domain, no class
pub fn get_record_v1_key(domain_key: &Pubkey, record: Record) -> Pubkey {
    child_key(RECORD_V1_PREFIX, record.as_str(), domain_key, None)
}

/// V2 record key: `\x02 || record` under the domain, class = records central state
pub fn get_record_v2_key(domain_key: &Pubkey, record: Record) -> Pubkey {
    let central_state = get_records_central_state();
    child_key(RECORD_V2_PREFIX, record.as_str(), domain_key, Some(&central_state))
}

/// Name tokenizer record for a domain
pub fn get_nft_record_key(domain_key: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"nft_record", domain_key.as_ref()], &NAME_TOKENIZER_ID).0
}

/// Mint of the NFT that tokenizes a domain
pub fn get_nft_mint(nft_record_key: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"tokenized_name", nft_record_key.as_ref()], &NAME_TOKENIZER_ID).0
}

/// Every account the resolver reads for one domain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainAccounts {
    pub domain: Pubkey,
    pub nft_record: Pubkey,
    pub sol_record_v1: Pubkey,
    pub sol_record_v2: Pubkey,
}

impl DomainAccounts {
    pub fn derive(domain_key: &Pubkey) -> Self {
        Self {
            domain: *domain_key,
            nft_record: get_nft_record_key(domain_key),
            sol_record_v1: get_record_v1_key(domain_key, Record::Sol),
            sol_record_v2: get_record_v2_key(domain_key, Record::Sol),
        }
    }

    /// Order matches the batched fetch in the resolver
    pub fn as_array(&self) -> [Pubkey; 4] {
        [self.domain, self.nft_record, self.sol_record_v1, self.sol_record_v2]
    }
}
