use anchor_lang::prelude::Pubkey;
use ed25519_dalek::{PublicKey, Signature, Verifier};

use crate::errors::{Result, SnsError};
use crate::state::RecordV1;

pub const SIGNATURE_LEN: usize = 64;
pub const PUBLIC_KEY_LEN: usize = 32;

/// Verify an Ed25519 signature
///
/// Returns `Ok(false)` for a well-formed signature that does not verify
/// (including keys that are not valid curve points). Only inputs of the wrong
/// length are errors.
pub fn verify_ed25519(message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool> {
    if signature.len() != SIGNATURE_LEN {
        return Err(SnsError::MalformedSignature {
            expected: SIGNATURE_LEN,
            actual: signature.len(),
        });
    }
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(SnsError::MalformedPublicKey {
            expected: PUBLIC_KEY_LEN,
            actual: public_key.len(),
        });
    }

    let Ok(key) = PublicKey::from_bytes(public_key) else {
        return Ok(false);
    };
    let Ok(signature) = Signature::try_from(signature) else {
        return Ok(false);
    };

    Ok(key.verify(message, &signature).is_ok())
}

/// Create the message a V1 SOL record signature covers
///
/// Message format: lowercase_hex(content || record_key), as UTF-8 bytes.
/// This is what wallets sign when the record is written on chain.
pub fn create_sol_record_message(content: &[u8], record_key: &Pubkey) -> Vec<u8> {
    let mut data = Vec::with_capacity(content.len() + 32);
    data.extend_from_slice(content);
    data.extend_from_slice(record_key.as_ref());

    hex::encode(data).into_bytes()
}

/// Check that a V1 SOL record was signed by `owner`
pub fn check_sol_record(record: &RecordV1, record_key: &Pubkey, owner: &Pubkey) -> Result<bool> {
    let signature = record.signature.ok_or_else(|| {
        SnsError::RecordMalformed("SOL record carries no signature".to_string())
    })?;

    let message = create_sol_record_message(&record.content, record_key);
    verify_ed25519(&message, &signature, owner.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Keypair, SecretKey, Signer};

    fn keypair(seed: u8) -> Keypair {
        let secret = SecretKey::from_bytes(&[seed; 32]).unwrap();
        let public = PublicKey::from(&secret);
        Keypair { secret, public }
    }

    #[test]
    fn test_verify_ed25519() {
        let signer = keypair(7);
        let signature = signer.sign(b"hello").to_bytes();

        assert!(verify_ed25519(b"hello", &signature, signer.public.as_bytes()).unwrap());
        assert!(!verify_ed25519(b"hellO", &signature, signer.public.as_bytes()).unwrap());
        assert!(!verify_ed25519(b"hello", &signature, keypair(8).public.as_bytes()).unwrap());
    }

    #[test]
    fn test_wrong_lengths_are_errors() {
        let signer = keypair(7);
        assert!(matches!(
            verify_ed25519(b"m", &[0u8; 63], signer.public.as_bytes()),
            Err(SnsError::MalformedSignature { expected: 64, actual: 63 })
        ));
        assert!(matches!(
            verify_ed25519(b"m", &[0u8; 64], &[0u8; 31]),
            Err(SnsError::MalformedPublicKey { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn test_create_sol_record_message() {
        let key = Pubkey::new_from_array([0xab; 32]);
        let message = create_sol_record_message(&[0x01, 0x02], &key);
        let expected = format!("0102{}", "ab".repeat(32));
        assert_eq!(message, expected.into_bytes());
    }

    #[test]
    fn test_check_sol_record() {
        let owner = keypair(1);
        let owner_key = Pubkey::new_from_array(owner.public.to_bytes());
        let record_key = Pubkey::new_unique();
        let content = [5u8; 32];

        let message = create_sol_record_message(&content, &record_key);
        let signature = owner.sign(&message).to_bytes();

        let record = RecordV1 {
            registry: crate::state::RegistryAccount {
                parent_name: Pubkey::default(),
                owner: owner_key,
                class: None,
                data: Vec::new(),
            },
            content: content.to_vec(),
            signature: Some(signature),
        };

        assert!(check_sol_record(&record, &record_key, &owner_key).unwrap());
        assert!(!check_sol_record(&record, &Pubkey::new_unique(), &owner_key).unwrap());
    }
}
