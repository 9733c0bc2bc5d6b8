use anchor_lang::solana_program::{pubkey, pubkey::Pubkey};

pub mod cache;
pub mod codec;
pub mod config;
pub mod derivation;
pub mod domains;
pub mod ed25519_utils;
pub mod encoding;
pub mod errors;
pub mod record;
pub mod records;
pub mod resolve;
pub mod rpc;
pub mod staleness;
pub mod state;
pub mod verification;

pub use cache::{OwnerCache, TtlCache};
pub use codec::{deserialize, serialize};
pub use config::{AllowPda, ResolverConfig};
pub use derivation::get_domain_key;
pub use errors::{Result, SnsError};
pub use record::Record;
pub use resolve::Resolver;
pub use rpc::{AccountData, MemoryRpc, RpcClient};
pub use verification::{ValidationFailure, ValidationResult};

/// SPL name service program
pub const NAME_PROGRAM_ID: Pubkey = pubkey!("namesLPneVptA9Z5rqUDD9tMTWEJwofgaYwp8cawRkX");

/// Parent of every top-level `.sol` domain
pub const ROOT_DOMAIN_ACCOUNT: Pubkey = pubkey!("58PwtjSDuFHuUkYjH9BYnnQKHfwo9reZhC2zMJv9JPkx");

/// Name tokenizer program (wraps domains into NFTs)
pub const NAME_TOKENIZER_ID: Pubkey = pubkey!("nftD3vbNkNqfj2Sd3HZwbpw4BxxKWr4AjGb9X38JeZk");

/// Records V2 program
pub const SNS_RECORDS_ID: Pubkey = pubkey!("HP3D4D1ZCmohQGFVms2SS4LCANgJyksBf5s1F77FuFjZ");

/// Prefix hashed in front of every name
pub const HASH_PREFIX: &str = "SPL Name Service";
