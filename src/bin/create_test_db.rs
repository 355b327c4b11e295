use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use household_ledger::{
    DEMO_PIN, PasswordHash, ValidatedPassword, initialize_db, insert_demo_data,
    user::{NewUser, create_user},
};

/// A utility for creating a test database for the household ledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
///
/// The user logs in with the login ID "test" and the password "test".
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let now = OffsetDateTime::now_utc();
    let user = create_user(
        NewUser {
            login_id: "test".to_owned(),
            name: "Test User".to_owned(),
            email: "test@example.com".to_owned(),
            phone: None,
            password_hash,
        },
        now,
        &conn,
    )?;

    println!("Creating bank accounts, cash transactions and stock holdings...");
    insert_demo_data(user.id, now, &conn)?;

    println!("Success! Every demo account uses the PIN {DEMO_PIN}.");

    Ok(())
}
