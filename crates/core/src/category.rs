use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name of the reserved terminal-fallback category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spending category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Category {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn unknown() -> Self {
        Category::new(UNKNOWN_CATEGORY, &[])
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_CATEGORY
    }

    /// Parse `[[categories]]` tables, guaranteeing the Unknown category exists.
    pub fn list_from_toml(content: &str) -> Result<Vec<Category>, CategoryError> {
        #[derive(Deserialize)]
        struct File {
            #[serde(default)]
            categories: Vec<Category>,
        }

        let file: File = toml::from_str(content)?;
        let categories = file.categories;
        if let Some(blank) = categories.iter().position(|c| c.name.trim().is_empty()) {
            return Err(CategoryError::BlankName(blank));
        }
        Ok(with_unknown(categories))
    }
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Failed to parse categories: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Category #{0} has a blank name")]
    BlankName(usize),
}

/// Append the Unknown category if the list lacks it.
pub fn with_unknown(mut categories: Vec<Category>) -> Vec<Category> {
    if !categories.iter().any(Category::is_unknown) {
        categories.push(Category::unknown());
    }
    categories
}

pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("Car", &["gas", "shell", "chevron", "exxon", "parking", "auto", "car wash"]),
    ("Groceries", &["whole foods", "trader joe", "safeway", "kroger", "grocery", "market"]),
    ("Dining", &["restaurant", "cafe", "coffee", "starbucks", "pizza", "doordash", "grubhub"]),
    ("Shopping", &["amazon", "amzn", "target", "walmart", "costco", "best buy"]),
    ("Utilities", &["electric", "water", "pg&e", "comcast", "verizon", "at&t"]),
    ("Travel", &["airline", "hotel", "airbnb", "uber", "lyft", "delta", "united"]),
    ("Entertainment", &["cinema", "theater", "ticketmaster", "steam"]),
    ("Health", &["pharmacy", "cvs", "walgreens", "dental", "clinic"]),
    ("Subscriptions", &["netflix", "spotify", "hulu", "subscription", "prime"]),
    (UNKNOWN_CATEGORY, &[]),
];

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, keywords)| Category::new(name, keywords))
        .collect()
}
