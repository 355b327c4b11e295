//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, UserID};

/// Database identifier for a category.
pub type CategoryId = i64;

/// Whether a category labels money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    /// The value stored in the database and used in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }

    /// The capitalised name shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
        }
    }
}

impl FromStr for CategoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            _ => Err(Error::InvalidCategory(None)),
        }
    }
}

impl Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A label for income or expenses (e.g., 'Salary', 'Food').
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub kind: CategoryKind,
    /// The user who created the category, or `None` for a default category
    /// that every user sees.
    pub owner_id: Option<UserID>,
}

impl Category {
    /// Whether this is one of the shared default categories.
    pub fn is_default(&self) -> bool {
        self.owner_id.is_none()
    }
}

/// Form data for category creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    pub kind: CategoryKind,
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{CategoryKind, CategoryName};

    #[test]
    fn name_is_trimmed() {
        assert_eq!(
            CategoryName::new("  Food \n").unwrap().as_ref(),
            "Food"
        );
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(CategoryName::new("\n\t \r"), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Income".parse(), Ok(CategoryKind::Income));
        assert_eq!("expense".parse(), Ok(CategoryKind::Expense));
        assert_eq!(
            "transfer".parse::<CategoryKind>(),
            Err(Error::InvalidCategory(None))
        );
    }
}
