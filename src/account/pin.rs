//! Four digit account PINs and their bcrypt hashes.

use std::fmt::Display;

use bcrypt::{hash, verify};

use crate::Error;

/// The bcrypt cost used when hashing PINs.
#[cfg(not(test))]
pub const PIN_HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
pub const PIN_HASH_COST: u32 = 4;

/// A PIN made of exactly four ASCII digits.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountPin(String);

impl AccountPin {
    /// Check that `raw_pin` is four digits.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAccountPin] otherwise.
    pub fn new(raw_pin: &str) -> Result<Self, Error> {
        let raw_pin = raw_pin.trim();

        if raw_pin.len() == 4 && raw_pin.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(raw_pin.to_owned()))
        } else {
            Err(Error::InvalidAccountPin)
        }
    }

    /// Validate a PIN and its confirmation.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAccountPin] if `raw_pin` is not four digits or
    /// [Error::PinMismatch] if the two differ.
    pub fn confirmed(raw_pin: &str, confirmation: &str) -> Result<Self, Error> {
        let pin = Self::new(raw_pin)?;

        if pin.0 != confirmation.trim() {
            return Err(Error::PinMismatch);
        }

        Ok(pin)
    }
}

impl std::fmt::Debug for AccountPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccountPin(****)")
    }
}

/// A salted and hashed [AccountPin].
#[derive(Debug, Clone, PartialEq)]
pub struct PinHash(String);

impl PinHash {
    /// Hash `pin` with bcrypt.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(pin: &AccountPin, cost: u32) -> Result<Self, Error> {
        hash(&pin.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read from the database.
    pub fn new_unchecked(raw_pin_hash: &str) -> Self {
        Self(raw_pin_hash.to_owned())
    }

    /// Check `raw_pin` against the hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::WrongAccountPin] if the PIN does not match and
    /// [Error::HashingError] if the hash could not be checked.
    pub fn verify(&self, raw_pin: &str) -> Result<(), Error> {
        match verify(raw_pin.trim(), &self.0) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::WrongAccountPin),
            Err(error) => {
                tracing::error!("could not verify account PIN: {error}");
                Err(Error::HashingError(error.to_string()))
            }
        }
    }
}

impl AsRef<str> for PinHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PinHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
