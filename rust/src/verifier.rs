//! The credential check itself: stored hash from the secret file, candidate
//! password from a reader, username against the invoking user.

use std::io::BufRead;
use std::path::Path;

use log::debug;

use crate::config::{read_line_zeroizing, ConfigError, VerifierConfig};
use crate::crypto::integrity::fixed_time_eq;
use crate::crypto::passwords::hash_against;
use crate::identity::{FixedIdentity, IdentityProvider};

pub const EXIT_AUTHORIZED: u8 = 0;
pub const EXIT_DENIED: u8 = 1;

/// Outcome of a single verification run.
#[derive(Debug)]
pub enum VerificationResult {
    Authorized,
    /// Wrong username, wrong password, or both. Which one is not recorded.
    Denied,
    ConfigurationError(ConfigError),
}

impl VerificationResult {
    pub fn exit_code(&self) -> u8 {
        match self {
            VerificationResult::Authorized => EXIT_AUTHORIZED,
            VerificationResult::Denied => EXIT_DENIED,
            VerificationResult::ConfigurationError(err) => err.exit_code(),
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, VerificationResult::Authorized)
    }
}

pub struct CredentialVerifier<I> {
    config: VerifierConfig,
    identity: I,
}

impl<I: IdentityProvider> CredentialVerifier<I> {
    pub fn new(config: VerifierConfig, identity: I) -> Self {
        Self { config, identity }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Reads the secret file, then one line from `password_reader`, and
    /// checks both the password and the username.
    pub fn verify<R: BufRead>(&self, password_reader: &mut R) -> VerificationResult {
        match self.check(password_reader) {
            Ok(true) => VerificationResult::Authorized,
            Ok(false) => VerificationResult::Denied,
            Err(err) => VerificationResult::ConfigurationError(err),
        }
    }

    fn check<R: BufRead>(&self, password_reader: &mut R) -> Result<bool, ConfigError> {
        let stored = self.config.load_secret()?;
        debug!("loaded stored hash from {}", self.config.secret_path.display());

        let candidate = read_line_zeroizing(password_reader)
            .map_err(|e| ConfigError::InputUnreadable(format!("{e}")))?;
        let current_user = self.identity.current_user()?;

        let computed = hash_against(&candidate, stored.expose())
            .map_err(|e| ConfigError::malformed(&self.config.secret_path, e))?;

        let correct_pass = fixed_time_eq(computed.as_bytes(), stored.expose().as_bytes());
        let correct_user = self.config.username == current_user;

        // Non-short-circuiting so both checks always run.
        Ok(correct_user & correct_pass)
    }
}

/// One-shot form taking every input explicitly, with `current_user` as the
/// already-resolved invoking identity.
pub fn verify<R: BufRead>(
    invoked_username: &str,
    secret_path: &Path,
    password_reader: &mut R,
    current_user: &str,
) -> VerificationResult {
    match VerifierConfig::new(invoked_username, secret_path) {
        Ok(config) => CredentialVerifier::new(config, FixedIdentity::new(current_user))
            .verify(password_reader),
        Err(err) => VerificationResult::ConfigurationError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityError;
    use std::fs;
    use std::io::{self, Cursor, Read};
    use tempfile::NamedTempFile;

    fn secret_file(contents: &str) -> NamedTempFile {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), contents).expect("write secret");
        file
    }

    fn sha512_of(password: &str) -> String {
        pwhash::sha512_crypt::hash_with("$6$rstudiosalt", password).expect("fixture")
    }

    fn run(username: &str, current_user: &str, secret: &NamedTempFile, input: &str) -> VerificationResult {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        verify(username, secret.path(), &mut reader, current_user)
    }

    #[test]
    fn matching_user_and_password_is_authorized() {
        let secret = secret_file(&format!("{}\n", sha512_of("correct")));
        let result = run("alice", "alice", &secret, "correct\n");
        assert!(result.is_authorized());
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn wrong_password_is_denied() {
        let secret = secret_file(&format!("{}\n", sha512_of("correct")));
        let result = run("alice", "alice", &secret, "wrong\n");
        assert!(matches!(result, VerificationResult::Denied));
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn username_mismatch_is_denied_even_with_correct_password() {
        let secret = secret_file(&format!("{}\n", sha512_of("correct")));
        let result = run("alice", "bob", &secret, "correct\n");
        assert!(matches!(result, VerificationResult::Denied));
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn missing_trailing_newline_on_input_is_accepted() {
        let secret = secret_file(&sha512_of("correct"));
        assert!(run("alice", "alice", &secret, "correct").is_authorized());
    }

    #[test]
    fn only_one_trailing_newline_is_stripped() {
        let secret = secret_file(&format!("{}\n", sha512_of("correct")));
        assert!(!run("alice", "alice", &secret, "correct\r\n").is_authorized());
        assert!(!run("alice", "alice", &secret, " correct\n").is_authorized());
    }

    #[test]
    fn empty_input_is_an_empty_password() {
        let empty_hash = secret_file(&format!("{}\n", sha512_of("")));
        assert!(run("alice", "alice", &empty_hash, "").is_authorized());

        let secret = secret_file(&format!("{}\n", sha512_of("correct")));
        assert!(matches!(run("alice", "alice", &secret, ""), VerificationResult::Denied));
    }

    #[test]
    fn non_utf8_input_is_a_wrong_password() {
        let secret = secret_file(&format!("{}\n", sha512_of("correct")));
        let mut reader = Cursor::new(vec![0xff, 0xfe, b'\n']);
        let result = verify("alice", secret.path(), &mut reader, "alice");
        assert!(matches!(result, VerificationResult::Denied));
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn yescrypt_secret_verifies() {
        let stored = "$y$j9T$LdJMENpBABJJ3hIHjB1Bi.$QN9z9KOlpvwSpj0fW8cLsXjckJ4U5F12i4NRfqrpik6";
        let secret = secret_file(&format!("{stored}\n"));
        assert!(run("alice", "alice", &secret, "correct\n").is_authorized());
        assert!(matches!(run("alice", "alice", &secret, "wrong\n"), VerificationResult::Denied));
    }

    #[test]
    fn empty_secret_file_never_authorizes() {
        let secret = secret_file("");
        let result = run("alice", "alice", &secret, "");
        assert!(matches!(
            result,
            VerificationResult::ConfigurationError(ConfigError::SecretEmpty(_))
        ));
        assert_eq!(result.exit_code(), 4);
    }

    #[test]
    fn unreadable_secret_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut reader = Cursor::new(b"correct\n".to_vec());
        let result = verify("alice", &dir.path().join("missing"), &mut reader, "alice");
        assert_eq!(result.exit_code(), 4);
    }

    #[test]
    fn malformed_argon2_secret_is_a_configuration_error() {
        let secret = secret_file("$argon2id$v=19$m=abc,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g\n");
        let result = run("alice", "alice", &secret, "correct\n");
        assert!(matches!(
            result,
            VerificationResult::ConfigurationError(ConfigError::SecretMalformed { .. })
        ));
        assert_eq!(result.exit_code(), 4);
    }

    #[test]
    fn empty_username_is_a_usage_error() {
        let secret = secret_file(&sha512_of("correct"));
        assert_eq!(run("", "alice", &secret, "correct\n").exit_code(), 2);
    }

    #[test]
    fn secret_file_is_read_before_stdin() {
        struct Untouched;
        impl Read for Untouched {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                panic!("stdin must not be read when the secret file is unusable");
            }
        }
        let dir = tempfile::tempdir().expect("temp dir");
        let mut reader = io::BufReader::new(Untouched);
        let result = verify("alice", &dir.path().join("missing"), &mut reader, "alice");
        assert_eq!(result.exit_code(), 4);
    }

    #[test]
    fn failed_identity_lookup_is_a_configuration_error() {
        struct NoIdentity;
        impl IdentityProvider for NoIdentity {
            fn current_user(&self) -> Result<String, IdentityError> {
                Err(IdentityError::UnknownUid(4242))
            }
        }
        let secret = secret_file(&sha512_of("correct"));
        let config = VerifierConfig::new("alice", secret.path()).unwrap();
        let result = CredentialVerifier::new(config, NoIdentity).verify(&mut Cursor::new(b"correct".to_vec()));
        assert!(matches!(
            result,
            VerificationResult::ConfigurationError(ConfigError::IdentityUnavailable(_))
        ));
        assert_eq!(result.exit_code(), 5);
    }

    #[test]
    fn argon2_secret_verifies() {
        use argon2::password_hash::SaltString;
        use argon2::{Argon2, PasswordHasher};

        let salt = SaltString::encode_b64(b"verifier-salt").unwrap();
        let stored = Argon2::default()
            .hash_password(b"correct", &salt)
            .unwrap()
            .to_string();
        let secret = secret_file(&format!("{stored}\n"));
        assert!(run("alice", "alice", &secret, "correct\n").is_authorized());
        assert!(!run("alice", "alice", &secret, "wrong\n").is_authorized());
    }
}
