//! Bank accounts: the table, the domain types and the queries scoped to an owner.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    account::pin::PinHash,
    account_ledger::{AccountSide, NewAccountTransaction, insert_account_transaction},
    error::is_unique_violation,
};

pub type AccountId = i64;

/// The banks an account can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    Kookmin,
    Shinhan,
    Woori,
    Hana,
    Nonghyup,
    Ibk,
}

impl Bank {
    /// Every bank in the order they are offered in forms.
    pub const ALL: [Bank; 6] = [
        Bank::Kookmin,
        Bank::Shinhan,
        Bank::Woori,
        Bank::Hana,
        Bank::Nonghyup,
        Bank::Ibk,
    ];

    /// The value stored in the database and sent by forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Bank::Kookmin => "kookmin",
            Bank::Shinhan => "shinhan",
            Bank::Woori => "woori",
            Bank::Hana => "hana",
            Bank::Nonghyup => "nonghyup",
            Bank::Ibk => "ibk",
        }
    }

    /// The bank's display name.
    pub fn name(&self) -> &'static str {
        match self {
            Bank::Kookmin => "KB Kookmin Bank",
            Bank::Shinhan => "Shinhan Bank",
            Bank::Woori => "Woori Bank",
            Bank::Hana => "Hana Bank",
            Bank::Nonghyup => "NH Nonghyup Bank",
            Bank::Ibk => "IBK Industrial Bank",
        }
    }
}

impl FromStr for Bank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bank::ALL
            .into_iter()
            .find(|bank| bank.as_str() == s)
            .ok_or(Error::NotFound)
    }
}

impl Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Check that `raw_number` is made of digits and hyphens and contains at least one digit.
///
/// Returns the trimmed number.
pub fn validate_account_number(raw_number: &str) -> Result<String, Error> {
    let number = raw_number.trim();

    let is_valid = number.chars().any(|c| c.is_ascii_digit())
        && number.chars().all(|c| c.is_ascii_digit() || c == '-')
        && !number.starts_with('-')
        && !number.ends_with('-');

    if is_valid {
        Ok(number.to_owned())
    } else {
        Err(Error::InvalidAccountNumber(number.to_owned()))
    }
}

/// A bank account owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: UserID,
    pub bank: Bank,
    pub number: String,
    pub pin_hash: PinHash,
    /// The current balance.
    pub balance: f64,
    pub created_at: Date,
}

/// The data needed to open an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner_id: UserID,
    pub bank: Bank,
    pub number: String,
    pub pin_hash: PinHash,
    /// Recorded as an opening deposit if non-zero.
    pub initial_balance: f64,
    pub created_at: Date,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            bank TEXT NOT NULL,
            number TEXT NOT NULL UNIQUE,
            pin TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_account_owner ON account(owner_id);",
    )?;

    Ok(())
}

const ACCOUNT_COLUMNS: &str = "id, owner_id, bank, number, pin, balance, created_at";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_bank: String = row.get(2)?;
    let bank = raw_bank
        .parse()
        .map_err(|_| rusqlite::Error::InvalidColumnType(2, "bank".to_owned(), Type::Text))?;
    let raw_pin_hash: String = row.get(4)?;

    Ok(Account {
        id: row.get(0)?,
        owner_id: UserID::new(row.get(1)?),
        bank,
        number: row.get(3)?,
        pin_hash: PinHash::new_unchecked(&raw_pin_hash),
        balance: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Open a new account.
///
/// A positive initial balance is also written to the ledger as an opening
/// deposit, so that the ledger snapshots agree with the account balance.
///
/// # Errors
///
/// Returns:
/// - [Error::NonPositiveAmount] if the initial balance is negative or not a number,
/// - [Error::DuplicateAccountNumber] if the number is already registered,
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    if !new_account.initial_balance.is_finite() || new_account.initial_balance < 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    let transaction = connection.unchecked_transaction()?;

    transaction
        .execute(
            "INSERT INTO account (owner_id, bank, number, pin, balance, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                new_account.owner_id.as_i64(),
                new_account.bank.as_str(),
                &new_account.number,
                new_account.pin_hash.as_ref(),
                new_account.initial_balance,
                new_account.created_at,
            ),
        )
        .map_err(|error| {
            if is_unique_violation(&error, "account.number") {
                Error::DuplicateAccountNumber(new_account.number.clone())
            } else {
                error.into()
            }
        })?;

    let id = transaction.last_insert_rowid();

    if new_account.initial_balance > 0.0 {
        insert_account_transaction(
            NewAccountTransaction {
                account_id: id,
                counterpart_account_id: None,
                side: AccountSide::Deposit,
                amount: new_account.initial_balance,
                balance: new_account.initial_balance,
                description: "Opening deposit".to_owned(),
                date: new_account.created_at,
                category_id: None,
            },
            &transaction,
        )?;
    }

    transaction.commit()?;

    Ok(Account {
        id,
        owner_id: new_account.owner_id,
        bank: new_account.bank,
        number: new_account.number,
        pin_hash: new_account.pin_hash,
        balance: new_account.initial_balance,
        created_at: new_account.created_at,
    })
}

/// Get the account with `account_id` if it belongs to `owner_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to someone else.
pub fn get_account(
    account_id: AccountId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_row((account_id, owner_id.as_i64()), map_row_to_account)
        .map_err(|error| error.into())
}

/// Get any user's account by its number.
///
/// Callers must not show the balance of an account the user does not own.
pub fn get_account_by_number(number: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE number = ?1"
        ))?
        .query_row([number.trim()], map_row_to_account)
        .map_err(|error| error.into())
}

/// Get the accounts owned by `owner_id`, oldest first.
pub fn get_accounts(owner_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE owner_id = ?1 ORDER BY created_at, id"
        ))?
        .query_map([owner_id.as_i64()], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get the total balance across the accounts owned by `owner_id`.
pub fn get_total_account_balance(owner_id: UserID, connection: &Connection) -> Result<f64, Error> {
    let total: f64 = connection.query_row(
        "SELECT COALESCE(SUM(balance), 0) FROM account WHERE owner_id = ?1",
        [owner_id.as_i64()],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// Delete an account and, through the foreign keys, its ledger rows.
///
/// # Errors
///
/// Returns [Error::DeleteMissingAccount] if `owner_id` has no such account.
pub fn delete_account(
    account_id: AccountId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND owner_id = ?2",
        (account_id, owner_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}

/// Replace the PIN hash of an account.
///
/// # Errors
///
/// Returns [Error::UpdateMissingAccount] if `owner_id` has no such account.
pub fn update_account_pin(
    account_id: AccountId,
    owner_id: UserID,
    pin_hash: &PinHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET pin = ?1 WHERE id = ?2 AND owner_id = ?3",
        (pin_hash.as_ref(), account_id, owner_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Set the balance of an account.
pub(crate) fn set_account_balance(
    account_id: AccountId,
    balance: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        (balance, account_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        UserID,
        account::{
            AccountPin, PinHash,
            core::{Account, Bank, NewAccount, create_account},
            pin::PIN_HASH_COST,
        },
    };

    /// Open an account with the PIN "1234".
    #[track_caller]
    pub(crate) fn insert_test_account(
        owner_id: UserID,
        number: &str,
        initial_balance: f64,
        connection: &Connection,
    ) -> Account {
        let pin = AccountPin::new("1234").unwrap();

        create_account(
            NewAccount {
                owner_id,
                bank: Bank::Shinhan,
                number: number.to_owned(),
                pin_hash: PinHash::new(&pin, PIN_HASH_COST).unwrap(),
                initial_balance,
                created_at: date!(2025 - 01 - 01),
            },
            connection,
        )
        .expect("Could not create test account")
    }
}

#[cfg(test)]
mod account_tests {
    use time::macros::date;

    use crate::{
        Error,
        account::{
            AccountPin, Bank, NewAccount, PinHash, create_account, delete_account, get_account,
            get_account_by_number, get_accounts, get_total_account_balance, pin::PIN_HASH_COST,
            test_utils::insert_test_account, update_account_pin, validate_account_number,
        },
        account_ledger::get_account_transactions,
        test_utils::{get_test_connection, insert_test_user},
    };

    #[test]
    fn account_number_allows_digits_and_hyphens() {
        assert_eq!(
            validate_account_number(" 110-123-456789 "),
            Ok("110-123-456789".to_owned())
        );

        for bad in ["", "---", "abc-123", "-123", "123-", "12 34"] {
            assert!(
                matches!(validate_account_number(bad), Err(Error::InvalidAccountNumber(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn bank_round_trips_through_str() {
        for bank in Bank::ALL {
            assert_eq!(bank.as_str().parse(), Ok(bank));
        }
    }

    #[test]
    fn create_account_records_opening_deposit() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);

        let account = insert_test_account(user.id, "110-1", 50_000.0, &connection);

        let ledger = get_account_transactions(account.id, &connection).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount, 50_000.0);
        assert_eq!(ledger[0].balance, 50_000.0);
        assert_eq!(get_account(account.id, user.id, &connection), Ok(account));
    }

    #[test]
    fn empty_account_has_no_ledger_rows() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);

        let account = insert_test_account(user.id, "110-1", 0.0, &connection);

        assert!(get_account_transactions(account.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn duplicate_number_fails() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        insert_test_account(user.id, "110-1", 0.0, &connection);

        let result = create_account(
            NewAccount {
                owner_id: user.id,
                bank: Bank::Woori,
                number: "110-1".to_owned(),
                pin_hash: PinHash::new_unchecked("hash"),
                initial_balance: 0.0,
                created_at: date!(2025 - 01 - 01),
            },
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateAccountNumber("110-1".to_owned())));
    }

    #[test]
    fn accounts_are_scoped_to_owner() {
        let connection = get_test_connection();
        let alice = insert_test_user("alice", &connection);
        let bob = insert_test_user("bob", &connection);
        let account = insert_test_account(alice.id, "110-1", 100.0, &connection);
        insert_test_account(bob.id, "220-2", 250.0, &connection);

        assert_eq!(get_account(account.id, bob.id, &connection), Err(Error::NotFound));
        assert_eq!(get_accounts(alice.id, &connection), Ok(vec![account.clone()]));
        assert_eq!(get_total_account_balance(alice.id, &connection), Ok(100.0));
        assert_eq!(get_total_account_balance(bob.id, &connection), Ok(250.0));
        assert_eq!(
            get_account_by_number("220-2", &connection).map(|account| account.owner_id),
            Ok(bob.id)
        );
        assert_eq!(
            delete_account(account.id, bob.id, &connection),
            Err(Error::DeleteMissingAccount)
        );
    }

    #[test]
    fn delete_account_cascades_to_ledger() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        let account = insert_test_account(user.id, "110-1", 100.0, &connection);

        delete_account(account.id, user.id, &connection).unwrap();

        assert_eq!(get_account(account.id, user.id, &connection), Err(Error::NotFound));
        assert!(get_account_transactions(account.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn update_pin_replaces_hash() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        let account = insert_test_account(user.id, "110-1", 0.0, &connection);
        let new_hash = PinHash::new(&AccountPin::new("9876").unwrap(), PIN_HASH_COST).unwrap();

        update_account_pin(account.id, user.id, &new_hash, &connection).unwrap();

        let account = get_account(account.id, user.id, &connection).unwrap();
        assert_eq!(account.pin_hash.verify("9876"), Ok(()));
        assert_eq!(
            update_account_pin(999, user.id, &new_hash, &connection),
            Err(Error::UpdateMissingAccount)
        );
    }
}
