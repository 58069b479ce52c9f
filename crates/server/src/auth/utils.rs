use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::models::session::SessionId;

pub const SESSION_ID_LENGTH: usize = 16;
pub const TOKEN_LENGTH: usize = 32;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn generate_token() -> Vec<u8> {
    let mut token = vec![0u8; TOKEN_LENGTH];
    OsRng.fill_bytes(&mut token);
    token
}

pub fn hash_token(token: &[u8]) -> [u8; 32] {
    Sha256::digest(token).into()
}

pub fn token_matches_hash(token: &[u8], expected_hash: &[u8]) -> bool {
    hash_token(token)[..].ct_eq(expected_hash).into()
}

pub fn pack_session_id_and_token(session_id: &SessionId, token: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(SESSION_ID_LENGTH + token.len());
    packed.extend_from_slice(session_id.as_bytes());
    packed.extend_from_slice(token);
    packed
}

pub fn unpack_session_id_and_token(packed: &[u8]) -> Option<(SessionId, &[u8])> {
    if packed.len() != SESSION_ID_LENGTH + TOKEN_LENGTH {
        return None;
    }
    let (sid, token) = packed.split_at(SESSION_ID_LENGTH);
    let sid = Uuid::from_slice(sid).ok()?;
    Some((sid, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("wonderland").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("wonderland", &hash));
        assert!(!verify_password("looking-glass", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("wonderland", "not a phc string"));
    }

    #[test]
    fn pack_and_unpack() {
        let sid = Uuid::new_v4();
        let token = generate_token();
        let packed = pack_session_id_and_token(&sid, &token);

        let (unpacked_sid, unpacked_token) = unpack_session_id_and_token(&packed).unwrap();
        assert_eq!(unpacked_sid, sid);
        assert_eq!(unpacked_token, token.as_slice());
    }

    #[test]
    fn unpack_rejects_wrong_length() {
        assert!(unpack_session_id_and_token(&[]).is_none());
        assert!(unpack_session_id_and_token(&[0u8; SESSION_ID_LENGTH]).is_none());
        assert!(unpack_session_id_and_token(&[0u8; SESSION_ID_LENGTH + TOKEN_LENGTH + 1]).is_none());
    }

    #[test]
    fn token_hash_comparison() {
        let token = generate_token();
        let hash = hash_token(&token);
        assert!(token_matches_hash(&token, &hash));
        assert!(!token_matches_hash(&generate_token(), &hash));
        assert!(!token_matches_hash(&token, &hash[..16]));
    }
}
