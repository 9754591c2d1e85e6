//! Hashes a candidate password "against" a stored hash string.
//! The stored value carries its own algorithm identifier, parameters, and salt,
//! so the candidate is re-hashed with exactly those settings and the resulting
//! string can be compared byte for byte with the stored one.

use argon2::{password_hash, Argon2, Params, PasswordHash, PasswordHasher, Version};
use mcf::{Base64, PasswordHashRef};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("stored argon2 hash is malformed: {0}")]
    Argon2(password_hash::Error),
    #[error("stored argon2 hash has no salt")]
    MissingSalt,
    #[error("stored yescrypt hash is malformed: {0}")]
    Yescrypt(String),
    #[error("stored crypt hash is malformed: {0}")]
    Crypt(String),
}

/// Hash families recognised from the prefix of a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    /// PHC strings produced by Argon2 (`$argon2id$`, `$argon2i$`, `$argon2d$`).
    Argon2,
    /// `$y$` strings, the default of current libxcrypt-based distributions.
    Yescrypt,
    /// The older `crypt(3)` formats: `$6$`, `$5$`, `$1$`, `$2a$`/`$2b$`/`$2y$`,
    /// `_` extended DES and two-character-salt DES.
    UnixCrypt,
}

impl HashScheme {
    pub fn detect(stored_hash: &str) -> Self {
        if stored_hash.starts_with("$argon2") {
            HashScheme::Argon2
        } else if stored_hash.starts_with("$y$") {
            HashScheme::Yescrypt
        } else {
            HashScheme::UnixCrypt
        }
    }
}

/// Computes the hash of `candidate` using the scheme, parameters, and salt
/// embedded in `stored_hash`. The candidate is taken as raw bytes, the way
/// `crypt(3)` takes it.
pub fn hash_against(candidate: &[u8], stored_hash: &str) -> Result<Zeroizing<String>, PasswordError> {
    match HashScheme::detect(stored_hash) {
        HashScheme::Argon2 => argon2_hash_against(candidate, stored_hash),
        HashScheme::Yescrypt => yescrypt_hash_against(candidate, stored_hash),
        HashScheme::UnixCrypt => pwhash::unix::crypt(candidate, stored_hash)
            .map(Zeroizing::new)
            .map_err(|e| PasswordError::Crypt(format!("{e}"))),
    }
}

fn argon2_hash_against(candidate: &[u8], stored_hash: &str) -> Result<Zeroizing<String>, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(PasswordError::Argon2)?;
    let salt = parsed.salt.ok_or(PasswordError::MissingSalt)?;
    let params = Params::try_from(&parsed).map_err(PasswordError::Argon2)?;

    // A PHC string without `v=` was produced by Argon2 1.0.
    let version = parsed.version.unwrap_or(Version::V0x10.into());

    let mut computed = Argon2::default()
        .hash_password_customized(candidate, Some(parsed.algorithm), Some(version), params, salt)
        .map_err(PasswordError::Argon2)?;
    computed.version = parsed.version;
    Ok(Zeroizing::new(computed.to_string()))
}

fn yescrypt_hash_against(candidate: &[u8], stored_hash: &str) -> Result<Zeroizing<String>, PasswordError> {
    let parsed = PasswordHashRef::new(stored_hash).map_err(|e| PasswordError::Yescrypt(format!("{e}")))?;
    let mut fields = parsed.fields();
    let (Some(setting), Some(salt), Some(stored_output), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(PasswordError::Yescrypt("expected $y$<params>$<salt>$<hash>".to_string()));
    };

    let params: yescrypt::Params = setting
        .as_str()
        .parse()
        .map_err(|e| PasswordError::Yescrypt(format!("{e}")))?;
    let salt_bytes = salt
        .decode_base64(Base64::Crypt)
        .map_err(|e| PasswordError::Yescrypt(format!("salt: {e}")))?;
    let output_len = stored_output
        .decode_base64(Base64::Crypt)
        .map_err(|e| PasswordError::Yescrypt(format!("hash: {e}")))?
        .len();
    if output_len == 0 {
        return Err(PasswordError::Yescrypt("hash field is empty".to_string()));
    }

    let mut output = Zeroizing::new(vec![0u8; output_len]);
    yescrypt::yescrypt(candidate, &salt_bytes, &params, &mut output)
        .map_err(|e| PasswordError::Yescrypt(format!("{e}")))?;

    // The setting and salt are kept as stored text; only the output is re-encoded.
    Ok(Zeroizing::new(format!(
        "${}${}${}${}",
        parsed.id(),
        setting,
        salt,
        Base64::Crypt.encode_string(&output)
    )))
}
