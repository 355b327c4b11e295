//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    account::create_account_table,
    account_ledger::create_account_transaction_table,
    cash::create_cash_transaction_table,
    category::{create_category_table, seed_default_categories},
    stock::create_stock_tables,
    transfer::create_transfer_table,
    user::create_user_table,
};

/// Create the tables for the domain models if they do not exist and seed
/// the default categories.
///
/// Also enables foreign key enforcement on `connection`, which SQLite needs
/// for cascading deletes.
///
/// # Errors
/// Returns an error if any of the tables could not be created. No tables are
/// created in this case.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_account_transaction_table(&transaction)?;
    create_cash_transaction_table(&transaction)?;
    create_transfer_table(&transaction)?;
    create_stock_tables(&transaction)?;
    seed_default_categories(&transaction)?;

    transaction.commit()
}
