//! Resolves the login name of the user running this process.

use nix::unistd::{getuid, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no passwd entry for uid {0}")]
    UnknownUid(u32),
    #[error("passwd lookup failed: {0}")]
    Lookup(String),
}

/// Source of the invoking user's name.
pub trait IdentityProvider {
    fn current_user(&self) -> Result<String, IdentityError>;
}

/// Looks up the real uid of the process in the system user database.
/// Environment variables such as `USER` or `LOGNAME` are ignored since the
/// caller controls them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdentity;

impl IdentityProvider for SystemIdentity {
    fn current_user(&self) -> Result<String, IdentityError> {
        let uid = getuid();
        match User::from_uid(uid) {
            Ok(Some(user)) => Ok(user.name),
            Ok(None) => Err(IdentityError::UnknownUid(uid.as_raw())),
            Err(errno) => Err(IdentityError::Lookup(format!("{errno}"))),
        }
    }
}

/// Always reports the same user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity(pub String);

impl FixedIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_user(&self) -> Result<String, IdentityError> {
        Ok(self.0.clone())
    }
}
