//! The session token kept in the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::UserID;

// Hours are always two digits, e.g. "2025-12-21 00:00:00.0 +09:00:00". The
// default `OffsetDateTime` format writes midnight as "0:00:00" which does not
// parse back.
time::serde::format_description!(
    expiry_format,
    OffsetDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] \
     [offset_hour sign:mandatory]:[offset_minute]:[offset_second]"
);

/// Identifies the logged-in user until `expires_at`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,
    #[serde(with = "expiry_format")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Whether the session has ended at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}
