//! Database operations for categories.

use std::collections::HashMap;

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryKind, CategoryName},
    error::is_unique_violation,
};

/// The expense categories every new database starts with.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 12] = [
    "Food",
    "Transport & Car",
    "Culture & Leisure",
    "Groceries & Convenience",
    "Fashion & Beauty",
    "Household Goods",
    "Housing & Telecom",
    "Health",
    "Education",
    "Events & Dues",
    "Parents",
    "Other",
];

/// The income categories every new database starts with.
pub const DEFAULT_INCOME_CATEGORIES: [&str; 5] =
    ["Salary", "Allowance", "Bonus", "Interest", "Other"];

/// Initialize the category table.
///
/// Default categories have no owner. The unique index treats them as owner 0
/// so seeding twice does not duplicate them.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            owner_id INTEGER REFERENCES user(id) ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_owner_name_kind
            ON category(IFNULL(owner_id, 0), name, kind);
        CREATE INDEX IF NOT EXISTS idx_category_kind ON category(kind);",
    )?;

    Ok(())
}

/// Insert the default categories. Categories that already exist are left alone.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection
        .prepare("INSERT OR IGNORE INTO category (name, kind, owner_id) VALUES (?1, ?2, NULL)")?;

    for name in DEFAULT_EXPENSE_CATEGORIES {
        statement.execute((name, CategoryKind::Expense.as_str()))?;
    }

    for name in DEFAULT_INCOME_CATEGORIES {
        statement.execute((name, CategoryKind::Income.as_str()))?;
    }

    Ok(())
}

/// Create a category owned by `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategory] if the user can already see a category
/// with the same name and kind, either their own or a default one.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    if find_category_by_name(user_id, name.as_ref(), kind, connection)?.is_some() {
        return Err(Error::DuplicateCategory(name.to_string()));
    }

    connection
        .execute(
            "INSERT INTO category (name, kind, owner_id) VALUES (?1, ?2, ?3);",
            (name.as_ref(), kind.as_str(), user_id.as_i64()),
        )
        .map_err(|error| {
            if is_unique_violation(&error, "idx_category_owner_name_kind") {
                Error::DuplicateCategory(name.to_string())
            } else {
                error.into()
            }
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        kind,
        owner_id: Some(user_id),
    })
}

/// Retrieve a category the user can see by ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such category or it belongs to
/// another user.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, owner_id FROM category
            WHERE id = ?1 AND (owner_id IS NULL OR owner_id = ?2);",
        )?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Find the category of `kind` called `name` that the user can see, ignoring case.
///
/// Returns `Ok(None)` if there is no such category.
pub fn find_category_by_name(
    user_id: UserID,
    name: &str,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    match connection
        .prepare(
            "SELECT id, name, kind, owner_id FROM category
            WHERE name = ?1 COLLATE NOCASE AND kind = ?2
                AND (owner_id IS NULL OR owner_id = ?3)
            ORDER BY owner_id IS NULL
            LIMIT 1;",
        )?
        .query_row((name.trim(), kind.as_str(), user_id.as_i64()), map_row)
    {
        Ok(category) => Ok(Some(category)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Retrieve the defaults and the user's own categories ordered by kind, then name.
pub fn get_all_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, owner_id FROM category
            WHERE owner_id IS NULL OR owner_id = ?1
            ORDER BY kind ASC, name ASC;",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the categories of one kind that the user can see, ordered by name.
pub fn get_categories_by_kind(
    user_id: UserID,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, owner_id FROM category
            WHERE kind = ?1 AND (owner_id IS NULL OR owner_id = ?2)
            ORDER BY name ASC;",
        )?
        .query_map((kind.as_str(), user_id.as_i64()), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the user's own categories.
///
/// Only the user's ledger rows can use the category, and they become uncategorised.
///
/// # Errors
///
/// Returns [Error::DeleteDefaultCategory] for a default category and
/// [Error::DeleteMissingCategory] if the user has no category with that ID.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND owner_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected > 0 {
        return Ok(());
    }

    match get_category(user_id, category_id, connection) {
        Ok(category) if category.is_default() => Err(Error::DeleteDefaultCategory),
        Ok(_) | Err(Error::NotFound) => Err(Error::DeleteMissingCategory),
        Err(error) => Err(error),
    }
}

/// Check that `category_id`, if given, refers to a category of `kind` that
/// the user can see.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category does not exist, belongs
/// to another user or is of the other kind.
pub fn validate_category(
    user_id: UserID,
    category_id: Option<CategoryId>,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(id) = category_id else {
        return Ok(());
    };

    match get_category(user_id, id, connection) {
        Ok(category) if category.kind == kind => Ok(()),
        Ok(_) | Err(Error::NotFound) => Err(Error::InvalidCategory(Some(id))),
        Err(error) => Err(error),
    }
}

/// Count the user's cash and account ledger rows that use each category.
pub fn count_transactions_per_category(
    user_id: UserID,
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM (
                SELECT category_id FROM cash_transaction WHERE user_id = ?1
                UNION ALL
                SELECT account_transaction.category_id FROM account_transaction
                INNER JOIN account ON account.id = account_transaction.account_id
                WHERE account.owner_id = ?1
            )
            WHERE category_id IS NOT NULL
            GROUP BY category_id",
        )?
        .query_map([user_id.as_i64()], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();

    result.map_err(Error::from)
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_kind: String = row.get(2)?;
    let kind = raw_kind
        .parse()
        .map_err(|_| rusqlite::Error::InvalidColumnType(2, "kind".to_owned(), Type::Text))?;
    let owner_id: Option<i64> = row.get(3)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
        owner_id: owner_id.map(UserID::new),
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error, UserID,
        category::{CategoryKind, CategoryName},
        test_utils::{get_test_connection, insert_test_user},
    };

    use super::{
        DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES, count_transactions_per_category,
        create_category, delete_category, find_category_by_name, get_all_categories,
        get_categories_by_kind, get_category, seed_default_categories, validate_category,
    };

    fn two_users() -> (Connection, UserID, UserID) {
        let connection = get_test_connection();
        let mina = insert_test_user("mina", &connection).id;
        let jun = insert_test_user("jun", &connection).id;

        (connection, mina, jun)
    }

    fn name(raw: &str) -> CategoryName {
        CategoryName::new_unchecked(raw)
    }

    #[test]
    fn defaults_are_seeded_once() {
        let (connection, mina, _) = two_users();
        seed_default_categories(&connection).unwrap();

        let expense = get_categories_by_kind(mina, CategoryKind::Expense, &connection).unwrap();
        let income = get_categories_by_kind(mina, CategoryKind::Income, &connection).unwrap();

        assert_eq!(expense.len(), DEFAULT_EXPENSE_CATEGORIES.len());
        assert_eq!(income.len(), DEFAULT_INCOME_CATEGORIES.len());
        assert!(income.iter().all(|category| category.kind == CategoryKind::Income));
        assert!(expense.iter().all(|category| category.is_default()));
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, mina, _) = two_users();

        let category =
            create_category(mina, name("Pets"), CategoryKind::Expense, &connection).unwrap();

        assert!(category.id > 0);
        assert_eq!(category.name, name("Pets"));
        assert_eq!(category.owner_id, Some(mina));
        assert_eq!(get_category(mina, category.id, &connection), Ok(category));
    }

    #[test]
    fn own_categories_are_private() {
        let (connection, mina, jun) = two_users();
        let pets = create_category(mina, name("Pets"), CategoryKind::Expense, &connection).unwrap();

        assert_eq!(get_category(jun, pets.id, &connection), Err(Error::NotFound));
        assert_eq!(
            find_category_by_name(jun, "Pets", CategoryKind::Expense, &connection),
            Ok(None)
        );
        assert_eq!(get_all_categories(mina, &connection).unwrap().len(), 18);
        assert_eq!(get_all_categories(jun, &connection).unwrap().len(), 17);
    }

    #[test]
    fn same_name_is_allowed_for_other_kind() {
        let (connection, mina, _) = two_users();

        let result = create_category(mina, name("Health"), CategoryKind::Income, &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn same_name_is_allowed_for_other_user() {
        let (connection, mina, jun) = two_users();

        create_category(mina, name("Golf"), CategoryKind::Expense, &connection).unwrap();
        let result = create_category(jun, name("Golf"), CategoryKind::Expense, &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn duplicate_category_fails() {
        let (connection, mina, _) = two_users();
        create_category(mina, name("Pets"), CategoryKind::Expense, &connection).unwrap();

        assert_eq!(
            create_category(mina, name("Food"), CategoryKind::Expense, &connection),
            Err(Error::DuplicateCategory("Food".to_owned()))
        );
        assert_eq!(
            create_category(mina, name("pets"), CategoryKind::Expense, &connection),
            Err(Error::DuplicateCategory("pets".to_owned()))
        );
    }

    #[test]
    fn all_categories_are_ordered_by_kind_then_name() {
        let (connection, mina, _) = two_users();
        create_category(mina, name("Lottery"), CategoryKind::Income, &connection).unwrap();

        let categories = get_all_categories(mina, &connection).unwrap();

        let keys: Vec<_> = categories
            .iter()
            .map(|category| (category.kind.as_str(), category.name.to_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(categories.len(), 18);
    }

    #[test]
    fn find_by_name_ignores_case() {
        let (connection, mina, _) = two_users();

        let found =
            find_category_by_name(mina, "salary", CategoryKind::Income, &connection).unwrap();
        let missing =
            find_category_by_name(mina, "salary", CategoryKind::Expense, &connection).unwrap();

        assert_eq!(found.map(|category| category.name.to_string()), Some("Salary".to_owned()));
        assert_eq!(missing, None);
    }

    #[test]
    fn delete_category_with_invalid_id_fails() {
        let (connection, mina, _) = two_users();

        assert_eq!(
            delete_category(mina, 999_999, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn only_owner_can_delete_category() {
        let (connection, mina, jun) = two_users();
        let pets = create_category(mina, name("Pets"), CategoryKind::Expense, &connection).unwrap();

        assert_eq!(
            delete_category(jun, pets.id, &connection),
            Err(Error::DeleteMissingCategory)
        );
        assert_eq!(delete_category(mina, pets.id, &connection), Ok(()));
        assert_eq!(get_category(mina, pets.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn default_category_cannot_be_deleted() {
        let (connection, mina, _) = two_users();
        let food = find_category_by_name(mina, "Food", CategoryKind::Expense, &connection)
            .unwrap()
            .unwrap();

        assert_eq!(
            delete_category(mina, food.id, &connection),
            Err(Error::DeleteDefaultCategory)
        );
        assert!(get_category(mina, food.id, &connection).is_ok());
    }

    #[test]
    fn validate_category_checks_kind_and_owner() {
        let (connection, mina, jun) = two_users();
        let salary = find_category_by_name(mina, "Salary", CategoryKind::Income, &connection)
            .unwrap()
            .unwrap();
        let pets = create_category(mina, name("Pets"), CategoryKind::Expense, &connection).unwrap();

        assert_eq!(
            validate_category(mina, Some(salary.id), CategoryKind::Income, &connection),
            Ok(())
        );
        assert_eq!(
            validate_category(mina, Some(salary.id), CategoryKind::Expense, &connection),
            Err(Error::InvalidCategory(Some(salary.id)))
        );
        assert_eq!(
            validate_category(mina, Some(999_999), CategoryKind::Expense, &connection),
            Err(Error::InvalidCategory(Some(999_999)))
        );
        assert_eq!(
            validate_category(jun, Some(pets.id), CategoryKind::Expense, &connection),
            Err(Error::InvalidCategory(Some(pets.id)))
        );
        assert_eq!(validate_category(mina, None, CategoryKind::Expense, &connection), Ok(()));
    }

    #[test]
    fn counts_only_the_users_rows() {
        let (connection, mina, jun) = two_users();
        let food = find_category_by_name(mina, "Food", CategoryKind::Expense, &connection)
            .unwrap()
            .unwrap();
        for user_id in [mina, jun, jun] {
            connection
                .execute(
                    "INSERT INTO cash_transaction
                        (user_id, side, amount, date, balance, description, memo, asset_type, category_id)
                    VALUES (?1, 'expense', 500.0, '2025-03-01', -500.0, '', '', 'Cash', ?2)",
                    (user_id.as_i64(), food.id),
                )
                .unwrap();
        }

        let counts = count_transactions_per_category(mina, &connection).unwrap();

        assert_eq!(counts.get(&food.id), Some(&1));
    }
}
