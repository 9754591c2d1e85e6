//! Single-shot credential check: a username asserted on the command line must
//! name the invoking user, and a password read from stdin must hash to the
//! value stored in a password file.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod verifier;

pub use config::{ConfigError, VerifierConfig, PASSWORD_FILE_ENV};
pub use identity::{FixedIdentity, IdentityProvider, SystemIdentity};
pub use verifier::{verify, CredentialVerifier, VerificationResult};
