pub mod ai;
pub mod banks;
pub mod canonical;
pub mod categorize;
pub mod csv;
pub mod factory;
pub mod heuristics;
pub mod parse;
pub mod persist;
pub(crate) mod util;

pub use ai::{AiCategorizer, AiError, MockCategorizer, OpenAiCompatibleCategorizer};
pub use canonical::{
    canonicalize, BankId, BankSpec, CanonicalStatement, CanonicalizeError, MappedRow, RowView,
};
pub use categorize::{Categorizer, KeywordIndex};
pub use csv::{read_statement, read_statement_file, write_canonical_csv, CsvError};
pub use factory::{CanonicalizerRegistry, FactoryError};
pub use heuristics::{map_raw_table_to_standard, map_raw_table_to_standard_in_year};
pub use parse::{parse_date, parse_date_in_year, parse_tolerant_amount};
pub use persist::{import_from_dataframe, ImportReport, PersistError, TransactionRepository};
