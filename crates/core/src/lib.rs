pub mod canonical;
pub mod category;
pub mod money;
pub mod raw_table;

pub use canonical::{sort_by_date, CanonicalRecord, CanonicalRow, CANONICAL_COLUMNS};
pub use category::{
    default_categories, with_unknown, Category, CategoryError, UserId, DEFAULT_CATEGORIES,
    UNKNOWN_CATEGORY,
};
pub use money::Money;
pub use raw_table::{cell, Cell, RawTable};
