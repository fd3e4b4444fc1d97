//! Errors from registering and logging in with an email and password.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from the local account flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The submitted email does not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] eazyy_core::EmailError),

    /// Unknown email or wrong password. The two are not told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration with an email that already has an account.
    #[error("email is already registered")]
    UserAlreadyExists,

    /// Registration password below the minimum length.
    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// Reading or writing the account failed.
    #[error("account storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// Argon2 could not hash the password or parse a stored hash.
    #[error("password hashing error")]
    PasswordHash,
}
