use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use household_ledger::{
    PasswordHash, ValidatedPassword,
    user::{User, get_user_by_login_id},
};

/// A utility for changing the password of a registered user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The login ID of the user whose password should be reset.
    #[arg(long)]
    login_id: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let mut conn = Connection::open(db_path)?;

    let user = match get_user_by_login_id(&args.login_id, &conn) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!("Could not load user \"{}\": {error}", args.login_id));
            exit(1);
        }
    };
    println!("Resetting password for {} ({})", user.login_id, user.email);

    let Some(password_hash) = get_new_password_hash() else {
        return Ok(());
    };
    update_password(&mut conn, &user, &password_hash)?;

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if !db_path.is_file() {
        print_error(format!("File does not exist at {db_path:#?}!"));
        exit(1);
    }
}

fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = prompt("Enter a new password: ")?;

        if let Err(error) = ValidatedPassword::new(&first_password) {
            print_error(error);
            continue;
        }

        let second_password = prompt("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::from_raw_password(&first_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("Could not hash password: {error}. Try again.")),
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    first.to_uppercase().chain(chars).collect()
}

fn update_password(
    conn: &mut Connection,
    user: &User,
    password: &PasswordHash,
) -> Result<(), rusqlite::Error> {
    let transaction = conn.transaction()?;

    let rows_affected = transaction.execute(
        "UPDATE user SET password = ?1 WHERE user.id = ?2;",
        (password.as_ref(), user.id.as_i64()),
    )?;

    if rows_affected != 1 {
        print_error(format!(
            "Updating password affected {rows_affected} user(s), expected 1. Rolling back..."
        ));
        transaction.rollback()?;
        return Err(rusqlite::Error::StatementChangedRows(rows_affected));
    }

    transaction.commit()?;

    println!("Password updated successfully!");

    Ok(())
}
