//! Minting and verification of the bearer session tokens handed out at
//! login. A token reads `localizard_<lookup>_<secret>`: the lookup half is
//! stored in plaintext for the indexed session fetch, the whole token is
//! argon2id-hashed for the actual check, and every token carries a fixed
//! 30-day lifetime from the moment it is minted.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "localizard";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 32;
const SESSION_TTL_DAYS: i64 = 30;

// Verified on every authenticated request, so tuned well below the
// account-password parameters.
const HASH_MEMORY_KIB: u32 = 8 * 1024;
const HASH_ITERATIONS: u32 = 2;
const HASH_LANES: u32 = 1;

/// A freshly minted session credential: the raw token goes to the client,
/// the remaining fields become the session row.
pub struct MintedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn mint_session_token() -> Result<MintedToken> {
    let lookup = random_chars(LOOKUP_LENGTH);
    let secret = random_chars(SECRET_LENGTH);
    let raw = format!("{TOKEN_PREFIX}_{lookup}_{secret}");

    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| Error::Config(format!("failed to hash session token: {e}")))?
        .to_string();

    Ok(MintedToken {
        raw,
        lookup,
        hash,
        expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
    })
}

pub fn verify_session_token(token: &str, hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| Error::Config(format!("invalid session hash: {e}")))?;

    match hasher().verify_password(token.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Config(format!("failed to verify session token: {e}"))),
    }
}

/// Extracts the lookup half of a presented token, rejecting anything that
/// does not have the exact minted shape.
pub fn token_lookup(token: &str) -> Result<String> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;
    if lookup.len() != LOOKUP_LENGTH
        || secret.len() != SECRET_LENGTH
        || !lookup.chars().all(|c| c.is_ascii_alphanumeric())
        || !secret.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(Error::InvalidTokenFormat);
    }

    Ok(lookup.to_string())
}

fn hasher() -> Argon2<'static> {
    let params =
        Params::new(HASH_MEMORY_KIB, HASH_ITERATIONS, HASH_LANES, None).expect("argon2 params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

fn random_chars(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
