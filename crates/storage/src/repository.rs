use async_trait::async_trait;
use chrono::NaiveDate;
use sift_core::{CanonicalRow, UserId};
use sift_import::{PersistError, TransactionRepository};
use tracing::debug;

use crate::db::DbPool;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredTransaction {
    pub id: i64,
    pub user_id: i64,
    pub card: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub category: String,
}

/// SQLite-backed transaction store.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_transactions(&self, user: UserId) -> Result<Vec<StoredTransaction>, sqlx::Error> {
        sqlx::query_as::<_, StoredTransaction>(
            "SELECT id, user_id, card, date, description, amount_cents, category
             FROM transactions WHERE user_id = ? ORDER BY date, id",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl TransactionRepository for SqliteRepository {
    async fn create_transaction(&self, user: UserId, row: &CanonicalRow) -> Result<i64, PersistError> {
        let amount_cents = row
            .amount
            .to_cents()
            .ok_or_else(|| PersistError::Rejected(format!("amount {} out of range", row.amount)))?;

        let result = sqlx::query(
            "INSERT INTO transactions (user_id, card, date, description, amount_cents, category)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.0)
        .bind(&row.card)
        .bind(row.date)
        .bind(&row.description)
        .bind(amount_cents)
        .bind(row.category_or_unknown())
        .execute(&self.pool)
        .await
        .map_err(|e| PersistError::Backend(Box::new(e)))?;

        let id = result.last_insert_rowid();
        debug!(id, %user, "Stored transaction");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_db;
    use sift_core::Money;
    use sift_import::import_from_dataframe;

    async fn repo() -> (tempfile::TempDir, SqliteRepository) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("test.db")).await.unwrap();
        (dir, SqliteRepository::new(pool))
    }

    fn row(day: u32, description: &str, cents: i64, category: Option<&str>) -> CanonicalRow {
        let mut row = CanonicalRow::new(
            "Costco Visa",
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description,
            Money::from_cents(cents),
        );
        row.category = category.map(str::to_string);
        row
    }

    #[tokio::test]
    async fn stores_and_lists_per_user() {
        let (_dir, repo) = repo().await;
        repo.create_transaction(UserId(1), &row(20, "SHELL OIL", 5000, Some("Car")))
            .await
            .unwrap();
        repo.create_transaction(UserId(1), &row(15, "REFUND", -1250, Some("Shopping")))
            .await
            .unwrap();
        repo.create_transaction(UserId(2), &row(16, "OTHER USER", 100, Some("Unknown")))
            .await
            .unwrap();

        let listed = repo.list_transactions(UserId(1)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].description, "REFUND");
        assert_eq!(listed[0].amount_cents, -1250);
        assert_eq!(listed[1].date, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
        assert_eq!(listed[1].category, "Car");
        assert_eq!(listed[1].card, "Costco Visa");
    }

    #[tokio::test]
    async fn unresolved_category_is_stored_as_unknown() {
        let (_dir, repo) = repo().await;
        repo.create_transaction(UserId(1), &row(1, "MYSTERY", 100, None))
            .await
            .unwrap();
        repo.create_transaction(UserId(1), &row(2, "BLANK", 200, Some("  ")))
            .await
            .unwrap();

        let stored = repo.list_transactions(UserId(1)).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|t| t.category == "Unknown"));
    }

    #[tokio::test]
    async fn import_stores_every_row() {
        let (_dir, repo) = repo().await;
        let rows = vec![
            row(1, "CAFE", 450, Some("Dining")),
            row(2, "UNSET", 100, None),
            row(3, "GAS", 3000, Some("Car")),
        ];
        let report = import_from_dataframe(&rows, UserId(5), &repo).await;
        assert_eq!(report.to_string(), "3 succeeded, 0 failed");
        assert!(report.errors.is_empty());

        let stored = repo.list_transactions(UserId(5)).await.unwrap();
        let categories: Vec<_> = stored.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(categories, vec!["Dining", "Unknown", "Car"]);
    }
}
