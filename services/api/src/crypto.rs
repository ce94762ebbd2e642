//! Password hashing and bearer token signing
//!
//! Passwords are stored as `saltHex$derivedHex` where the derived key is
//! PBKDF2-HMAC-SHA256 over the password with the salt, 100 000 rounds,
//! 32 bytes. Tokens are `base64(claims).hexHmacSha256` over the encoded
//! claims. All comparisons of secret material are constant time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const PBKDF2_ROUNDS: u32 = 100_000;
const DERIVED_LEN: usize = 32;
const SALT_LEN: usize = 12;

/// Claims embedded in a signed access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: u64,
    pub exp: i64,
}

/// `n` random bytes as a lowercase hex string. Used for salts, stream
/// keys and opaque session tokens.
pub fn random_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn derive(password: &str, salt: &str) -> [u8; DERIVED_LEN] {
    let mut out = [0u8; DERIVED_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut out);
    out
}

/// Hashes a password with a fresh random salt. Two calls for the same
/// plaintext produce different stored forms.
pub fn hash_password(password: &str) -> String {
    let salt = random_hex(SALT_LEN);
    let derived = derive(password, &salt);
    format!("{salt}${}", hex::encode(derived))
}

/// Verifies a password against a stored form. Fails closed on a
/// malformed stored form; the comparison is constant time.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, derived_hex)) = stored.split_once('$') else {
        return false;
    };
    if salt.is_empty() || derived_hex.is_empty() {
        return false;
    }
    let Ok(derived) = hex::decode(derived_hex) else {
        return false;
    };
    let check = derive(password, salt);
    check.as_slice().ct_eq(&derived).into()
}

fn signature(secret: &str, encoded_claims: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(encoded_claims.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Issues a signed bearer token for a user, valid for `ttl_secs`.
pub fn sign_token(secret: &str, user_id: u64, ttl_secs: i64) -> String {
    let claims = TokenClaims {
        user_id,
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    let body = serde_json::to_string(&claims).expect("claims always serialize");
    let encoded = BASE64.encode(body);
    let sig = signature(secret, &encoded);
    format!("{encoded}.{sig}")
}

/// Verifies a token, returning its claims. Returns `None` on malformed
/// structure, signature mismatch or expiry; it never panics on
/// attacker-controlled input.
pub fn verify_token(secret: &str, token: &str) -> Option<TokenClaims> {
    let (encoded, sig) = token.split_once('.')?;
    let expected = signature(secret, encoded);
    if !bool::from(sig.as_bytes().ct_eq(expected.as_bytes())) {
        return None;
    }
    let body = BASE64.decode(encoded).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&body).ok()?;
    if chrono::Utc::now().timestamp() > claims.exp {
        return None;
    }
    Some(claims)
}
