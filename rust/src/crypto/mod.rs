//! Cryptographic helpers for the verifier: re-hashing a candidate password with
//! the stored hash's own settings, and comparing hash strings in fixed time.

pub mod integrity;
pub mod passwords;
