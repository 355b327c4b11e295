//! Transfers between bank accounts, possibly owned by different users.

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    account::{AccountId, Bank, get_account, get_account_by_number, set_account_balance},
    account_ledger::{AccountSide, NewAccountTransaction, insert_account_transaction},
};

pub type TransferId = i64;

/// The smallest amount that can be transferred.
pub const MINIMUM_TRANSFER_AMOUNT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: f64,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// A transfer as requested by the sender.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub pin: String,
    pub to_account_number: String,
    pub amount: f64,
    pub description: String,
}

pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transfer (
            id INTEGER PRIMARY KEY,
            from_account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            to_account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            amount REAL NOT NULL CHECK (amount > 0),
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transfer_from ON transfer(from_account_id);
        CREATE INDEX IF NOT EXISTS idx_transfer_to ON transfer(to_account_id);",
    )?;

    Ok(())
}

/// Move money from one of `owner_id`'s accounts to any account.
///
/// The checks run in this order:
/// 1. the sending account belongs to `owner_id` ([Error::NotFound]),
/// 2. the PIN matches ([Error::WrongAccountPin]),
/// 3. the amount is at least [MINIMUM_TRANSFER_AMOUNT] ([Error::TransferAmountTooSmall]),
/// 4. the recipient exists ([Error::UnknownAccountNumber]),
/// 5. the recipient is a different account ([Error::SelfTransfer]),
/// 6. the sender can cover the amount ([Error::InsufficientFunds]).
///
/// Both balances, the transfer row and one ledger row per account are
/// written in a single SQL transaction. Nothing is written on error.
pub fn create_transfer(
    owner_id: UserID,
    request: TransferRequest,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transfer, Error> {
    let transaction = connection.unchecked_transaction()?;

    let sender = get_account(request.from_account_id, owner_id, &transaction)?;
    sender.pin_hash.verify(&request.pin)?;

    if !request.amount.is_finite() || request.amount < MINIMUM_TRANSFER_AMOUNT {
        return Err(Error::TransferAmountTooSmall(request.amount));
    }

    let to_account_number = request.to_account_number.trim();
    let recipient = match get_account_by_number(to_account_number, &transaction) {
        Ok(recipient) => recipient,
        Err(Error::NotFound) => {
            return Err(Error::UnknownAccountNumber(to_account_number.to_owned()));
        }
        Err(error) => return Err(error),
    };

    if recipient.id == sender.id {
        return Err(Error::SelfTransfer);
    }

    if request.amount > sender.balance {
        return Err(Error::InsufficientFunds {
            balance: sender.balance,
            requested: request.amount,
        });
    }

    let sender_balance = sender.balance - request.amount;
    let recipient_balance = recipient.balance + request.amount;
    set_account_balance(sender.id, sender_balance, &transaction)?;
    set_account_balance(recipient.id, recipient_balance, &transaction)?;

    let description = request.description.trim().to_owned();
    transaction.execute(
        "INSERT INTO transfer (from_account_id, to_account_id, amount, description, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (sender.id, recipient.id, request.amount, &description, now),
    )?;
    let transfer_id = transaction.last_insert_rowid();

    let date = now.date();
    insert_account_transaction(
        NewAccountTransaction {
            account_id: sender.id,
            counterpart_account_id: Some(recipient.id),
            side: AccountSide::Withdrawal,
            amount: request.amount,
            balance: sender_balance,
            description: transfer_description(&description, &recipient.number),
            date,
            category_id: None,
        },
        &transaction,
    )?;
    insert_account_transaction(
        NewAccountTransaction {
            account_id: recipient.id,
            counterpart_account_id: Some(sender.id),
            side: AccountSide::Deposit,
            amount: request.amount,
            balance: recipient_balance,
            description: transfer_description(&description, &sender.number),
            date,
            category_id: None,
        },
        &transaction,
    )?;

    transaction.commit()?;

    Ok(Transfer {
        id: transfer_id,
        from_account_id: sender.id,
        to_account_id: recipient.id,
        amount: request.amount,
        description,
        created_at: now,
    })
}

fn transfer_description(description: &str, counterpart_number: &str) -> String {
    if description.is_empty() {
        format!("Transfer {counterpart_number}")
    } else {
        format!("Transfer {counterpart_number}: {description}")
    }
}

/// One side of a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferParty {
    pub account_id: AccountId,
    pub owner_id: UserID,
    pub holder_name: String,
    pub bank: Bank,
    pub account_number: String,
}

/// A transfer with the details of both accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDetail {
    pub id: TransferId,
    pub amount: f64,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub from: TransferParty,
    pub to: TransferParty,
}

impl TransferDetail {
    /// Whether `user_id` sent this transfer. Transfers between a user's own
    /// accounts count as sent.
    pub fn is_sent_by(&self, user_id: UserID) -> bool {
        self.from.owner_id == user_id
    }
}

const TRANSFER_DETAIL_QUERY: &str = "SELECT t.id, t.amount, t.description, t.created_at,
        f.id, f.owner_id, fu.name, f.bank, f.number,
        r.id, r.owner_id, ru.name, r.bank, r.number
    FROM transfer t
    INNER JOIN account f ON f.id = t.from_account_id
    INNER JOIN user fu ON fu.id = f.owner_id
    INNER JOIN account r ON r.id = t.to_account_id
    INNER JOIN user ru ON ru.id = r.owner_id";

fn map_party(row: &Row, offset: usize) -> Result<TransferParty, rusqlite::Error> {
    let raw_bank: String = row.get(offset + 3)?;
    let bank = raw_bank.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(offset + 3, "bank".to_owned(), Type::Text)
    })?;

    Ok(TransferParty {
        account_id: row.get(offset)?,
        owner_id: UserID::new(row.get(offset + 1)?),
        holder_name: row.get(offset + 2)?,
        bank,
        account_number: row.get(offset + 4)?,
    })
}

fn map_transfer_detail(row: &Row) -> Result<TransferDetail, rusqlite::Error> {
    Ok(TransferDetail {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        from: map_party(row, 4)?,
        to: map_party(row, 9)?,
    })
}

/// Get a transfer that `user_id` sent or received.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user owns neither account.
pub fn get_transfer(
    transfer_id: TransferId,
    user_id: UserID,
    connection: &Connection,
) -> Result<TransferDetail, Error> {
    connection
        .prepare(&format!(
            "{TRANSFER_DETAIL_QUERY} WHERE t.id = ?1 AND (f.owner_id = ?2 OR r.owner_id = ?2)"
        ))?
        .query_row((transfer_id, user_id.as_i64()), map_transfer_detail)
        .map_err(Error::from)
}

/// Get the transfers touching `user_id`'s accounts, newest first.
///
/// With `account_id`, only transfers into or out of that account are returned.
pub fn get_transfer_history(
    user_id: UserID,
    account_id: Option<AccountId>,
    connection: &Connection,
) -> Result<Vec<TransferDetail>, Error> {
    let mut statement = connection.prepare(&format!(
        "{TRANSFER_DETAIL_QUERY}
        WHERE (f.owner_id = ?1 OR r.owner_id = ?1)
            AND (?2 IS NULL OR t.from_account_id = ?2 OR t.to_account_id = ?2)
        ORDER BY t.created_at DESC, t.id DESC"
    ))?;

    statement
        .query_map((user_id.as_i64(), account_id), map_transfer_detail)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}
