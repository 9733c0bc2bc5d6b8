use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_pack::Pack;
use anchor_spl::token::spl_token;

use crate::errors::{Result, SnsError};
use crate::record::Record;

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(bytes)
}

fn ensure_len(account: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(SnsError::TruncatedAccount {
            account,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Name registry state for a domain (the SPL name service header)
///
/// Layout:
/// [0..32]:   parent_name
/// [32..64]:  owner
/// [64..96]:  class (all zero when the name has no class)
/// [96..]:    data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryAccount {
    /// Parent name account (the root `.sol` account for top-level domains)
    pub parent_name: Pubkey,

    /// Current owner of the name
    pub owner: Pubkey,

    /// Authority allowed to rewrite the name, if any
    pub class: Option<Pubkey>,

    /// Opaque trailing bytes (V1 record content lives here)
    pub data: Vec<u8>,
}

impl RegistryAccount {
    /// Account header size: 32 (parent) + 32 (owner) + 32 (class) = 96 bytes
    pub const LEN: usize = 32 + 32 + 32;

    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure_len("registry", data, Self::LEN)?;

        let class = read_pubkey(data, 64);
        Ok(Self {
            parent_name: read_pubkey(data, 0),
            owner: read_pubkey(data, 32),
            class: (class != Pubkey::default()).then_some(class),
            data: data[Self::LEN..].to_vec(),
        })
    }
}

/// Scheme securing one of the two proofs of a V2 record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Validation {
    None,
    Solana,
    Ethereum,
    UnverifiedSolana,
}

impl Validation {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Solana),
            2 => Some(Self::Ethereum),
            3 => Some(Self::UnverifiedSolana),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Solana => 1,
            Self::Ethereum => 2,
            Self::UnverifiedSolana => 3,
        }
    }

    /// Length of the id this scheme stores in the record body
    pub fn id_len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Solana | Self::UnverifiedSolana => 32,
            Self::Ethereum => 20,
        }
    }
}

/// Fixed 8-byte header that follows the registry header in a V2 record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeaderV2 {
    pub staleness_validation: u16,
    pub roa_validation: u16,
    pub content_length: u32,
}

impl RecordHeaderV2 {
    /// 2 (staleness) + 2 (roa) + 4 (content length)
    pub const LEN: usize = 2 + 2 + 4;

    /// Header offset inside the record account
    pub const OFFSET: usize = RegistryAccount::LEN;

    /// Decode the header from a full record account
    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure_len("record header", data, Self::OFFSET + Self::LEN)?;
        let h = &data[Self::OFFSET..Self::OFFSET + Self::LEN];

        Ok(Self {
            staleness_validation: u16::from_le_bytes([h[0], h[1]]),
            roa_validation: u16::from_le_bytes([h[2], h[3]]),
            content_length: u32::from_le_bytes([h[4], h[5], h[6], h[7]]),
        })
    }

    pub fn encode(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0..2].copy_from_slice(&self.staleness_validation.to_le_bytes());
        out[2..4].copy_from_slice(&self.roa_validation.to_le_bytes());
        out[4..8].copy_from_slice(&self.content_length.to_le_bytes());
        out
    }

    pub fn staleness(&self) -> Result<Validation> {
        Validation::from_u16(self.staleness_validation).ok_or_else(|| {
            SnsError::InvalidValidation(format!(
                "unknown staleness validation {}",
                self.staleness_validation
            ))
        })
    }

    pub fn roa(&self) -> Result<Validation> {
        Validation::from_u16(self.roa_validation).ok_or_else(|| {
            SnsError::InvalidValidation(format!("unknown RoA validation {}", self.roa_validation))
        })
    }
}

/// Bounded slice: anything that runs past the buffer comes back empty
fn slice_or_empty(data: &[u8], start: usize, len: usize) -> &[u8] {
    match start.checked_add(len) {
        Some(end) if end <= data.len() => &data[start..end],
        _ => &[],
    }
}

/// Decoded V2 record account: registry header, record header and body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordV2 {
    pub registry: RegistryAccount,
    pub header: RecordHeaderV2,
    pub staleness_id: Vec<u8>,
    pub roa_id: Vec<u8>,
    pub content: Vec<u8>,
}

impl RecordV2 {
    /// Body offset: registry header + record header
    pub const BODY_OFFSET: usize = RecordHeaderV2::OFFSET + RecordHeaderV2::LEN;

    pub fn decode(data: &[u8]) -> Result<Self> {
        let registry = RegistryAccount::decode(data)?;
        let header = RecordHeaderV2::decode(data)?;

        let staleness_len = header.staleness()?.id_len();
        let roa_len = header.roa()?.id_len();

        let mut offset = Self::BODY_OFFSET;
        let staleness_id = slice_or_empty(data, offset, staleness_len).to_vec();
        offset += staleness_len;
        let roa_id = slice_or_empty(data, offset, roa_len).to_vec();
        offset += roa_len;
        let content = slice_or_empty(data, offset, header.content_length as usize).to_vec();

        Ok(Self {
            registry,
            header,
            staleness_id,
            roa_id,
            content,
        })
    }

    /// Content bytes, with an empty slice reported as malformed
    pub fn require_content(&self) -> Result<&[u8]> {
        if self.content.is_empty() {
            return Err(SnsError::RecordMalformed(
                "record content is empty or runs past the account data".to_string(),
            ));
        }
        Ok(&self.content)
    }

    pub fn staleness_id_pubkey(&self) -> Option<Pubkey> {
        <[u8; 32]>::try_from(self.staleness_id.as_slice())
            .ok()
            .map(Pubkey::new_from_array)
    }

    /// Serialize a V2 record account (registry header + record header + body)
    pub fn encode(
        registry: &RegistryAccount,
        staleness: Validation,
        staleness_id: &[u8],
        roa: Validation,
        roa_id: &[u8],
        content: &[u8],
    ) -> Vec<u8> {
        let header = RecordHeaderV2 {
            staleness_validation: staleness.as_u16(),
            roa_validation: roa.as_u16(),
            content_length: content.len() as u32,
        };

        let mut out = Vec::with_capacity(
            Self::BODY_OFFSET + staleness_id.len() + roa_id.len() + content.len(),
        );
        out.extend_from_slice(&registry.parent_name.to_bytes());
        out.extend_from_slice(&registry.owner.to_bytes());
        out.extend_from_slice(&registry.class.unwrap_or_default().to_bytes());
        out.extend_from_slice(&header.encode());
        out.extend_from_slice(staleness_id);
        out.extend_from_slice(roa_id);
        out.extend_from_slice(content);
        out
    }
}

/// Legacy record account: content at a fixed offset, optionally signed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordV1 {
    pub registry: RegistryAccount,
    pub content: Vec<u8>,
    /// Only SOL records carry a signature
    pub signature: Option<[u8; 64]>,
}

impl RecordV1 {
    pub const CONTENT_OFFSET: usize = RegistryAccount::LEN;
    pub const SIGNATURE_LEN: usize = 64;

    /// Decode a V1 record account for `record`.
    ///
    /// Fixed-width kinds slice exactly their width (SOL additionally the
    /// 64-byte signature after it). Text kinds keep everything after the
    /// header; trimming is left to the codec.
    pub fn decode(data: &[u8], record: Record) -> Result<Self> {
        let registry = RegistryAccount::decode(data)?;
        let start = Self::CONTENT_OFFSET;

        let (content, signature) = match record.width() {
            Some(width) if record == Record::Sol => {
                let end = start + width + Self::SIGNATURE_LEN;
                ensure_len("SOL record", data, end)?;
                let mut signature = [0u8; 64];
                signature.copy_from_slice(&data[start + width..end]);
                (data[start..start + width].to_vec(), Some(signature))
            }
            Some(width) => {
                ensure_len("record", data, start + width)?;
                (data[start..start + width].to_vec(), None)
            }
            None => (data[start..].to_vec(), None),
        };

        Ok(Self {
            registry,
            content,
            signature,
        })
    }
}

/// Tokenization state of a domain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NftTag {
    Uninitialized,
    CentralState,
    ActiveRecord,
    InactiveRecord,
}

impl NftTag {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::CentralState),
            2 => Some(Self::ActiveRecord),
            3 => Some(Self::InactiveRecord),
            _ => None,
        }
    }
}

/// Name tokenizer record for a domain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NftRecord {
    pub tag: NftTag,
    pub nonce: u8,
    pub name_account: Pubkey,
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
}

impl NftRecord {
    /// 1 (tag) + 1 (nonce) + 32 (name) + 32 (owner) + 32 (mint) = 98 bytes
    pub const LEN: usize = 1 + 1 + 32 + 32 + 32;

    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure_len("NFT record", data, Self::LEN)?;
        let tag = NftTag::from_u8(data[0])
            .ok_or_else(|| SnsError::RecordMalformed(format!("unknown NFT record tag {}", data[0])))?;

        Ok(Self {
            tag,
            nonce: data[1],
            name_account: read_pubkey(data, 2),
            owner: read_pubkey(data, 34),
            nft_mint: read_pubkey(data, 66),
        })
    }

    pub fn is_active(&self) -> bool {
        self.tag == NftTag::ActiveRecord
    }

    pub fn encode(&self) -> Vec<u8> {
        let tag = match self.tag {
            NftTag::Uninitialized => 0u8,
            NftTag::CentralState => 1,
            NftTag::ActiveRecord => 2,
            NftTag::InactiveRecord => 3,
        };
        let mut out = Vec::with_capacity(Self::LEN);
        out.push(tag);
        out.push(self.nonce);
        out.extend_from_slice(&self.name_account.to_bytes());
        out.extend_from_slice(&self.owner.to_bytes());
        out.extend_from_slice(&self.nft_mint.to_bytes());
        out
    }
}

/// The fields of an SPL token account the resolver needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccount {
    pub const LEN: usize = spl_token::state::Account::LEN;

    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure_len("token", data, Self::LEN)?;
        let account = spl_token::state::Account::unpack(&data[..Self::LEN])
            .map_err(|e| SnsError::RecordMalformed(format!("token account: {e}")))?;
        Ok(Self {
            mint: account.mint,
            owner: account.owner,
            amount: account.amount,
        })
    }
}
