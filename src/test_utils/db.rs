use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::macros::datetime;

use crate::{
    PasswordHash, User,
    db::initialize,
    user::{NewUser, create_user},
};

/// An in-memory database with every table created and the default categories seeded.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Same as [get_test_connection] but wrapped for use in handler states.
#[track_caller]
pub(crate) fn get_shared_test_connection() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(get_test_connection()))
}

/// Insert a user with the login ID `login_id` and a dummy password hash.
#[track_caller]
pub(crate) fn insert_test_user(login_id: &str, connection: &Connection) -> User {
    create_user(
        NewUser {
            login_id: login_id.to_owned(),
            name: format!("{login_id} name"),
            email: format!("{login_id}@example.com"),
            phone: None,
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        datetime!(2025-01-01 09:00 +9),
        connection,
    )
    .expect("Could not create test user")
}
