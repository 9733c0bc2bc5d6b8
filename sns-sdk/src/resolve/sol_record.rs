use anchor_lang::prelude::Pubkey;

use super::StepOutcome;
use crate::ed25519_utils::check_sol_record;
use crate::errors::SnsError;
use crate::record::Record;
use crate::rpc::AccountData;
use crate::state::{RecordV1, RecordV2, RegistryAccount, Validation};
use crate::verification::{verify_record_staleness, verify_right_of_association};

fn present(account: Option<&AccountData>) -> Option<&AccountData> {
    account.filter(|a| !a.data.is_empty())
}

/// V2 SOL record
///
/// The record counts only when it holds a 32-byte address, both proofs use
/// Solana validation, it was written by the current owner and the address
/// itself signed off on it. Any failed check falls through.
pub fn resolve_sol_record_v2(account: Option<&AccountData>, registry: &RegistryAccount) -> StepOutcome {
    let Some(account) = present(account) else {
        return StepOutcome::skip();
    };

    let record = match RecordV2::decode(&account.data) {
        Ok(record) => record,
        Err(err) => return StepOutcome::reject(err),
    };

    let content = match record.require_content() {
        Ok(content) if content.len() == 32 => content,
        Ok(content) => {
            return StepOutcome::reject(SnsError::RecordMalformed(format!(
                "SOL record content is {} bytes, expected 32",
                content.len()
            )))
        }
        Err(err) => return StepOutcome::reject(err),
    };

    let solana = Validation::Solana.as_u16();
    if record.header.staleness_validation != solana || record.header.roa_validation != solana {
        return StepOutcome::reject(SnsError::InvalidValidation(format!(
            "SOL record uses staleness validation {} and RoA validation {}, both must be Solana",
            record.header.staleness_validation, record.header.roa_validation
        )));
    }

    let staleness = verify_record_staleness(&record, &registry.owner);
    if let Some(reason) = staleness.reason() {
        return StepOutcome::reject(SnsError::InvalidRoA(reason));
    }

    let roa = verify_right_of_association(&record, Validation::Solana, None);
    if let Some(reason) = roa.reason() {
        return StepOutcome::reject(SnsError::InvalidRoA(reason));
    }

    let mut owner = [0u8; 32];
    owner.copy_from_slice(content);
    StepOutcome::Resolved(Pubkey::new_from_array(owner))
}

/// V1 SOL record: resolves when its signature was made by the registry owner
pub fn resolve_sol_record_v1(
    account: Option<&AccountData>,
    record_key: &Pubkey,
    registry: &RegistryAccount,
) -> StepOutcome {
    let Some(account) = present(account) else {
        return StepOutcome::skip();
    };

    let record = match RecordV1::decode(&account.data, Record::Sol) {
        Ok(record) => record,
        Err(err) => return StepOutcome::reject(err),
    };

    match check_sol_record(&record, record_key, &registry.owner) {
        Ok(true) => {
            let mut owner = [0u8; 32];
            owner.copy_from_slice(&record.content);
            StepOutcome::Resolved(Pubkey::new_from_array(owner))
        }
        Ok(false) => StepOutcome::reject(SnsError::InvalidSignature(format!(
            "SOL record {record_key} is not signed by owner {}",
            registry.owner
        ))),
        Err(err) => StepOutcome::reject(err),
    }
}
