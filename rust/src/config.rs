//! Explicit verifier configuration. The entry point builds a `VerifierConfig`
//! once from argv and the environment; nothing below it reads global state.

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::passwords::PasswordError;
use crate::identity::IdentityError;

/// Environment variable naming the file that holds the stored password hash.
pub const PASSWORD_FILE_ENV: &str = "RSTUDIO_PASSWORD_FILE";

pub const EXIT_USAGE: u8 = 2;
pub const EXIT_MISSING_PASSWORD_FILE_ENV: u8 = 3;
pub const EXIT_SECRET_UNUSABLE: u8 = 4;
pub const EXIT_HOST_UNAVAILABLE: u8 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a username argument is required")]
    MissingUsername,
    #[error("variable {0} is not set")]
    MissingPasswordFileEnv(&'static str),
    #[error("password file {} unreadable: {}", .path.display(), .source)]
    SecretUnreadable { path: PathBuf, source: io::Error },
    #[error("password file {} is empty", .0.display())]
    SecretEmpty(PathBuf),
    #[error("password file {} does not hold a usable hash: {}", .path.display(), .reason)]
    SecretMalformed { path: PathBuf, reason: String },
    #[error("invoking user unavailable: {0}")]
    IdentityUnavailable(#[from] IdentityError),
    #[error("password input unreadable: {0}")]
    InputUnreadable(String),
}

impl ConfigError {
    /// Process exit status for this failure. Every code differs from the
    /// authentication-denied status.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::MissingUsername => EXIT_USAGE,
            ConfigError::MissingPasswordFileEnv(_) => EXIT_MISSING_PASSWORD_FILE_ENV,
            ConfigError::SecretUnreadable { .. }
            | ConfigError::SecretEmpty(_)
            | ConfigError::SecretMalformed { .. } => EXIT_SECRET_UNUSABLE,
            ConfigError::IdentityUnavailable(_) | ConfigError::InputUnreadable(_) => {
                EXIT_HOST_UNAVAILABLE
            }
        }
    }

    pub(crate) fn malformed(path: &Path, err: PasswordError) -> Self {
        ConfigError::SecretMalformed {
            path: path.to_path_buf(),
            reason: format!("{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Username asserted on the command line.
    pub username: String,
    /// File whose first line is the stored password hash.
    pub secret_path: PathBuf,
}

impl VerifierConfig {
    pub fn new(username: impl Into<String>, secret_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let username = username.into();
        if username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        Ok(Self {
            username,
            secret_path: secret_path.into(),
        })
    }

    /// Reads the secret-file location from the process environment.
    pub fn from_env(username: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(username, |name| std::env::var_os(name))
    }

    /// Same as [`VerifierConfig::from_env`] with a caller-supplied lookup.
    /// An empty value counts as unset.
    pub fn from_lookup<F>(username: impl Into<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&str) -> Option<OsString>,
    {
        let username = username.into();
        if username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        let secret_path = lookup(PASSWORD_FILE_ENV)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingPasswordFileEnv(PASSWORD_FILE_ENV))?;
        Self::new(username, secret_path)
    }

    /// Loads the first line of the secret file. The handle is closed before
    /// this returns, whatever the outcome.
    pub fn load_secret(&self) -> Result<StoredSecret, ConfigError> {
        load_stored_secret(&self.secret_path)
    }
}

/// The stored password hash. Wiped from memory on drop and never printed.
pub struct StoredSecret(Zeroizing<String>);

impl StoredSecret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoredSecret(<redacted>)")
    }
}

/// Reads one line as raw bytes, dropping a single trailing `\n` and nothing else.
pub(crate) fn read_line_zeroizing<R: BufRead>(reader: &mut R) -> io::Result<Zeroizing<Vec<u8>>> {
    let mut buf = Zeroizing::new(Vec::new());
    reader.read_until(b'\n', &mut buf)?;
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(buf)
}

pub fn load_stored_secret(path: &Path) -> Result<StoredSecret, ConfigError> {
    let unreadable = |source: io::Error| ConfigError::SecretUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unreadable)?;
    let mut line = read_line_zeroizing(&mut BufReader::new(file)).map_err(unreadable)?;
    if line.is_empty() {
        return Err(ConfigError::SecretEmpty(path.to_path_buf()));
    }
    match String::from_utf8(std::mem::take(&mut *line)) {
        Ok(text) => Ok(StoredSecret(Zeroizing::new(text))),
        Err(err) => {
            err.into_bytes().zeroize();
            Err(ConfigError::SecretMalformed {
                path: path.to_path_buf(),
                reason: "line is not valid UTF-8".to_string(),
            })
        }
    }
}
