//! Passwords for logging in.
//!
//! A raw password becomes a [ValidatedPassword] once it passes the length and
//! strength checks, and only a [ValidatedPassword] can be turned into the
//! bcrypt [PasswordHash] that is stored with the user.

use std::fmt::{self, Display};

use bcrypt::BcryptError;
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// The minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A password that passed the strength checks but is not hashed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check that `raw_password` is at least [MIN_PASSWORD_LENGTH] characters
    /// long and that zxcvbn scores it as strong.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with a message for the user, including
    /// zxcvbn's suggestions when the password is long enough but guessable.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let length = raw_password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(Error::TooWeak(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long."
            )));
        }

        let entropy = zxcvbn(raw_password, &[]);
        if matches!(entropy.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let advice = entropy
            .feedback()
            .map(ToString::to_string)
            .unwrap_or_else(|| "Password is too easy to guess.".to_owned());

        Err(Error::TooWeak(advice))
    }

    /// Skip the strength checks, e.g. for seeding a manual test database.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

/// A salted bcrypt hash of a user's password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used for real users. Tests use the minimum cost of 4.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds of bcrypt.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost or fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Validate then hash `raw_password`.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        ValidatedPassword::new(raw_password).and_then(|password| Self::new(password, cost))
    }

    /// Whether `raw_password` is the password this hash was made from.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
