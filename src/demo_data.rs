//! Dummy data for manual testing, used by the `create_test_db` binary.

use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error, UserID,
    account::{AccountPin, Bank, NewAccount, PIN_HASH_COST, PinHash, create_account},
    account_ledger::{AccountEntry, AccountSide, record_account_transaction},
    cash::{CashSide, NewCashTransaction, create_cash_transactions},
    category::{CategoryId, CategoryKind, find_category_by_name},
    stock::{
        Currency, NewStockAccount, NewStockHolding, add_stock_holding, create_stock_account,
        upsert_quote,
    },
    transfer::{TransferRequest, create_transfer},
};

/// The PIN of every demo bank and brokerage account.
pub const DEMO_PIN: &str = "1234";

fn category_id(
    user_id: UserID,
    name: &str,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    Ok(find_category_by_name(user_id, name, kind, connection)?.map(|category| category.id))
}

fn cash_row(
    side: CashSide,
    amount: f64,
    date: Date,
    description: &str,
    asset_type: &str,
    category_id: Option<CategoryId>,
) -> NewCashTransaction {
    NewCashTransaction {
        side,
        amount,
        date,
        description: description.to_owned(),
        memo: String::new(),
        asset_type: asset_type.to_owned(),
        category_id,
    }
}

/// Give `user_id` two bank accounts with a few deposits, withdrawals and a
/// transfer between them, a month and a half of cash rows, and a brokerage
/// account with one domestic and one US holding plus quotes for both.
///
/// # Errors
///
/// Returns an error if any of the rows could not be inserted, e.g. because
/// the demo account numbers are already registered.
pub fn insert_demo_data(
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let today = now.date();
    let opened = today - Duration::days(60);
    let pin_hash = PinHash::new(&AccountPin::new(DEMO_PIN)?, PIN_HASH_COST)?;

    let salary = category_id(user_id, "Salary", CategoryKind::Income, connection)?;
    let food = category_id(user_id, "Food", CategoryKind::Expense, connection)?;
    let transport = category_id(user_id, "Transport & Car", CategoryKind::Expense, connection)?;
    let housing = category_id(user_id, "Housing & Telecom", CategoryKind::Expense, connection)?;
    let groceries = category_id(
        user_id,
        "Groceries & Convenience",
        CategoryKind::Expense,
        connection,
    )?;

    let checking = create_account(
        NewAccount {
            owner_id: user_id,
            bank: Bank::Shinhan,
            number: "110-123-456789".to_owned(),
            pin_hash: pin_hash.clone(),
            initial_balance: 1_500_000.0,
            created_at: opened,
        },
        connection,
    )?;
    let savings = create_account(
        NewAccount {
            owner_id: user_id,
            bank: Bank::Kookmin,
            number: "123-45-678901".to_owned(),
            pin_hash: pin_hash.clone(),
            initial_balance: 5_000_000.0,
            created_at: opened,
        },
        connection,
    )?;

    let account_entries = [
        (AccountSide::Deposit, 3_200_000.0, 45, "Monthly salary", salary),
        (AccountSide::Withdrawal, 650_000.0, 40, "Rent", housing),
        (AccountSide::Withdrawal, 55_000.0, 38, "Mobile and internet", housing),
        (AccountSide::Deposit, 3_200_000.0, 15, "Monthly salary", salary),
        (AccountSide::Withdrawal, 650_000.0, 10, "Rent", housing),
    ];
    for (side, amount, days_ago, description, category_id) in account_entries {
        record_account_transaction(
            checking.id,
            user_id,
            AccountEntry {
                side,
                amount,
                date: today - Duration::days(days_ago),
                description: description.to_owned(),
                category_id,
            },
            today,
            connection,
        )?;
    }

    create_transfer(
        user_id,
        TransferRequest {
            from_account_id: checking.id,
            pin: DEMO_PIN.to_owned(),
            to_account_number: savings.number.clone(),
            amount: 1_000_000.0,
            description: "Savings".to_owned(),
        },
        now,
        connection,
    )?;

    let cash_rows: Vec<NewCashTransaction> = (0..45)
        .step_by(3)
        .flat_map(|days_ago| {
            let date = today - Duration::days(days_ago);
            [
                cash_row(CashSide::Expense, 9_500.0, date, "Lunch", "Card", food),
                cash_row(CashSide::Expense, 1_450.0, date, "Bus fare", "Card", transport),
            ]
        })
        .chain([
            cash_row(
                CashSide::Income,
                300_000.0,
                today - Duration::days(44),
                "ATM withdrawal",
                "Cash",
                None,
            ),
            cash_row(
                CashSide::Expense,
                48_200.0,
                today - Duration::days(20),
                "Weekly groceries",
                "Cash",
                groceries,
            ),
        ])
        .collect();
    create_cash_transactions(user_id, cash_rows, connection)?;

    let brokerage = create_stock_account(
        NewStockAccount {
            owner_id: user_id,
            company: "Mirae Asset".to_owned(),
            number: "7001-2345-67".to_owned(),
            pin_hash,
            created_at: opened,
        },
        connection,
    )?;
    let holdings = [
        ("005930", 71_000.0, 30.0, Currency::Krw, 78_500.0),
        ("AAPL", 182.5, 12.0, Currency::Usd, 171.2),
    ];
    for (ticker, purchase_price, shares, currency, quote) in holdings {
        add_stock_holding(
            user_id,
            NewStockHolding {
                stock_account_id: brokerage.id,
                ticker: ticker.to_owned(),
                purchase_price,
                shares,
                currency,
                created_at: opened,
            },
            connection,
        )?;
        upsert_quote(ticker, quote, now, connection)?;
    }

    tracing::info!("Inserted demo data for user {user_id}");

    Ok(())
}
