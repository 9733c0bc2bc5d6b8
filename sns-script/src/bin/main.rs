//! Offline SNS tooling
//!
//! Codec commands work on values alone. Everything else reads accounts from a
//! JSON snapshot (`{"accounts": [{"address", "owner", "data"}]}`, data in hex).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anchor_lang::prelude::Pubkey;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sns_sdk::derivation::{get_domain_key, get_record_v1_key, get_record_v2_key};
use sns_sdk::domains::get_domains_for_owner;
use sns_sdk::records::{get_record_v1, get_record_v2, VerifyOptions};
use sns_sdk::staleness::check_staleness;
use sns_sdk::verification::{StalenessCheck, ValidationResult};
use sns_sdk::{codec, AllowPda, MemoryRpc, Record, Resolver, ResolverConfig};

#[derive(Parser, Debug)]
#[command(name = "sns", version, about = "Solana Name Service record codec and resolver")]
struct Cli {
    /// Resolver settings as JSON; flags below override it
    #[arg(long, env = "SNS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Per-call RPC timeout in milliseconds
    #[arg(long, env = "SNS_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a record value, prints hex
    Serialize {
        #[arg(long)]
        record: Record,
        #[arg(long)]
        value: String,
    },

    /// Decode hex record content
    Deserialize {
        #[arg(long)]
        record: Record,
        #[arg(long = "hex")]
        data: String,
    },

    /// Resolve the owner of a domain
    Resolve {
        #[arg(long, env = "SNS_SNAPSHOT")]
        snapshot: PathBuf,
        #[arg(long)]
        domain: String,
        /// deny | any | existing | comma separated program ids
        #[arg(long, env = "SNS_ALLOW_PDA")]
        allow_pda: Option<AllowPda>,
    },

    /// Derive a domain or record address
    Key {
        #[arg(long)]
        domain: String,
        #[arg(long)]
        record: Option<Record>,
        /// Derive the V2 record address instead of V1
        #[arg(long, requires = "record")]
        v2: bool,
    },

    /// Read a record of a domain
    Record {
        #[arg(long, env = "SNS_SNAPSHOT")]
        snapshot: PathBuf,
        #[arg(long)]
        domain: String,
        #[arg(long)]
        record: Record,
        #[arg(long)]
        v2: bool,
    },

    /// List the domains owned by a wallet
    Domains {
        #[arg(long, env = "SNS_SNAPSHOT")]
        snapshot: PathBuf,
        #[arg(long)]
        owner: Pubkey,
    },

    /// Check the timestamp stored in an account
    Stale {
        #[arg(long, env = "SNS_SNAPSHOT")]
        snapshot: PathBuf,
        #[arg(long)]
        address: Pubkey,
        /// Byte offset of the u64 LE timestamp
        #[arg(long)]
        offset: usize,
        /// Use the price-oracle window instead of the record window
        #[arg(long)]
        oracle: bool,
        /// Overrides the configured window
        #[arg(long)]
        max_age: Option<u64>,
        /// Unix time to check against, defaults to now
        #[arg(long)]
        now: Option<i64>,
    },
}

#[derive(Serialize)]
struct CheckReport {
    valid: bool,
    reason: Option<String>,
}

impl From<&ValidationResult> for CheckReport {
    fn from(result: &ValidationResult) -> Self {
        Self {
            valid: result.valid,
            reason: result.reason(),
        }
    }
}

fn load_config(cli: &Cli) -> Result<ResolverConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ResolverConfig::default(),
    };
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }
    Ok(config)
}

fn load_snapshot(path: &Path) -> Result<Arc<MemoryRpc>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let rpc = MemoryRpc::from_json(&raw)?;
    debug!(snapshot = %path.display(), "snapshot loaded");
    Ok(Arc::new(rpc))
}

fn staleness_check(config: &ResolverConfig, offset: usize, oracle: bool, max_age: Option<u64>) -> StalenessCheck {
    let check = if oracle {
        StalenessCheck::oracle_from(&config.staleness, offset)
    } else {
        StalenessCheck::record_from(&config.staleness, offset)
    };
    match max_age {
        Some(max_age) => check.with_max_age(max_age),
        None => check,
    }
}

fn unix_now() -> Result<i64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(i64::try_from(elapsed.as_secs())?)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let timeout = config.timeout();

    match cli.command {
        Command::Serialize { record, value } => {
            let bytes = codec::serialize(&value, record)?;
            println!("{}", hex::encode(bytes));
        }
        Command::Deserialize { record, data } => {
            let bytes = hex::decode(data.trim_start_matches("0x")).context("invalid hex")?;
            println!("{}", codec::deserialize(&bytes, record)?);
        }
        Command::Resolve {
            snapshot,
            domain,
            allow_pda,
        } => {
            let rpc = load_snapshot(&snapshot)?;
            let config = match allow_pda {
                Some(allow_pda) => config.with_allow_pda(allow_pda),
                None => config,
            };
            info!(%domain, allow_pda = ?config.allow_pda, "resolving");
            let owner = Resolver::new(rpc).with_config(config).resolve(&domain).await?;
            println!("{owner}");
        }
        Command::Key { domain, record, v2 } => {
            let domain_key = get_domain_key(&domain)?;
            let key = match record {
                Some(record) if v2 => get_record_v2_key(&domain_key, record),
                Some(record) => get_record_v1_key(&domain_key, record),
                None => domain_key,
            };
            println!("{key}");
        }
        Command::Record {
            snapshot,
            domain,
            record,
            v2,
        } => {
            let rpc = load_snapshot(&snapshot)?;
            if v2 {
                match get_record_v2(rpc.as_ref(), &domain, record, VerifyOptions::all(), timeout).await? {
                    Some(entry) => {
                        let report = serde_json::json!({
                            "key": entry.key.to_string(),
                            "value": entry.value,
                            "staleness": entry.staleness.as_ref().map(CheckReport::from),
                            "roa": entry.roa.as_ref().map(CheckReport::from),
                        });
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    None => println!("no {record} V2 record for {domain}"),
                }
            } else {
                match get_record_v1(rpc.as_ref(), &domain, record, timeout).await? {
                    Some(entry) => {
                        let report = serde_json::json!({
                            "key": entry.key.to_string(),
                            "value": entry.value,
                            "signature": entry.signature.as_ref().map(CheckReport::from),
                        });
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    None => println!("no {record} V1 record for {domain}"),
                }
            }
        }
        Command::Domains { snapshot, owner } => {
            let rpc = load_snapshot(&snapshot)?;
            for domain in get_domains_for_owner(rpc.as_ref(), &owner, timeout).await? {
                println!("{domain}");
            }
        }
        Command::Stale {
            snapshot,
            address,
            offset,
            oracle,
            max_age,
            now,
        } => {
            let rpc = load_snapshot(&snapshot)?;
            let check = staleness_check(&config, offset, oracle, max_age);
            let now = match now {
                Some(now) => now,
                None => unix_now()?,
            };
            let result = check_staleness(rpc.as_ref(), &address, &check, now, timeout).await?;
            println!("{}", serde_json::to_string_pretty(&CheckReport::from(&result))?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "sns",
            "resolve",
            "--snapshot",
            "accounts.json",
            "--domain",
            "bonfida.sol",
            "--allow-pda",
            "existing",
        ])
        .unwrap();

        match cli.command {
            Command::Resolve { domain, allow_pda, .. } => {
                assert_eq!(domain, "bonfida.sol");
                assert_eq!(allow_pda, Some(AllowPda::Existing));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_record_names() {
        let cli = Cli::try_parse_from(["sns", "serialize", "--record", "inj", "--value", "x"]).unwrap();
        assert!(matches!(cli.command, Command::Serialize { record: Record::Injective, .. }));

        assert!(Cli::try_parse_from(["sns", "serialize", "--record", "nope", "--value", "x"]).is_err());
        assert!(Cli::try_parse_from(["sns", "key", "--domain", "a", "--v2"]).is_err());
    }

    #[test]
    fn test_stale_windows() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"staleness": {"record_max_age_secs": 900, "oracle_max_age_secs": 15}}"#)
                .unwrap();

        let cli = Cli::try_parse_from([
            "sns", "stale", "--snapshot", "a.json", "--address", "11111111111111111111111111111111",
            "--offset", "8", "--oracle",
        ])
        .unwrap();
        let Command::Stale { offset, oracle, max_age, .. } = cli.command else {
            panic!("expected stale");
        };
        assert!(oracle);
        assert_eq!(staleness_check(&config, offset, oracle, max_age).max_age_secs, 15);
        assert_eq!(staleness_check(&config, offset, false, max_age).max_age_secs, 900);
        assert_eq!(staleness_check(&config, offset, oracle, Some(3)).max_age_secs, 3);
    }

    #[test]
    fn test_timeout_flag_overrides_default() {
        let cli = Cli::try_parse_from(["sns", "--timeout-ms", "250", "key", "--domain", "a"]).unwrap();
        assert_eq!(load_config(&cli).unwrap().timeout(), Duration::from_millis(250));
    }
}
