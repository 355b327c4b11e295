//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, error::is_unique_violation};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The maximum number of characters in a login ID.
pub const MAX_LOGIN_ID_LENGTH: usize = 20;
/// The maximum number of digits in a phone number.
pub const MAX_PHONE_DIGITS: usize = 11;

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub login_id: String,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// An optional phone number, digits only.
    pub phone: Option<String>,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user signed up.
    pub created_at: OffsetDateTime,
}

/// The data needed to create a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The unique ID the user logs in with.
    pub login_id: String,
    /// The user's display name.
    pub name: String,
    /// The user's email address, unique across users.
    pub email: String,
    /// An optional phone number, digits only.
    pub phone: Option<String>,
    /// The hash of the password chosen at sign-up.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                login_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateLoginId] if the login ID is taken,
/// - [Error::DuplicateEmail] if the email is already registered,
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    new_user: NewUser,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .execute(
            "INSERT INTO user (login_id, name, email, phone, password, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &new_user.login_id,
                &new_user.name,
                &new_user.email,
                &new_user.phone,
                new_user.password_hash.as_ref(),
                created_at,
            ),
        )
        .map_err(|error| {
            if is_unique_violation(&error, "user.login_id") {
                Error::DuplicateLoginId(new_user.login_id.clone())
            } else if is_unique_violation(&error, "user.email") {
                Error::DuplicateEmail(new_user.email.clone())
            } else {
                error.into()
            }
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        login_id: new_user.login_id,
        name: new_user.name,
        email: new_user.email,
        phone: new_user.phone,
        password_hash: new_user.password_hash,
        created_at,
    })
}

const USER_COLUMNS: &str = "id, login_id, name, email, phone, password, created_at";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(5)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        login_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(6)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user that logs in with `login_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the login ID.
pub fn get_user_by_login_id(login_id: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE login_id = :login_id"
        ))?
        .query_row(&[(":login_id", login_id)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}
