// sqlx::Error -> AppError
//
// Orphan rules prevent `From<sqlx::Error> for AppError` here, so every query
// maps through this helper.

use ezyq_core::error::AppError;

/// Convert a sqlx error, keeping the SQLite extended result code.
///
/// Constraint failures on the engine's invariants (duplicate ticket, second
/// live entry, second history row, occupancy CHECK) surface as
/// ConcurrencyViolation.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some(code @ ("2067" | "1555" | "275")) => AppError::ConcurrencyViolation(format!(
                    "Constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                Some(code @ ("787" | "3850")) => AppError::Database(format!(
                    "Foreign key constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                Some("5") => AppError::Database(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                Some("13") => AppError::Database(format!("Database full: {}", db_err.message())),
                Some(code) => AppError::Database(format!(
                    "Database error [{}]: {}",
                    code,
                    db_err.message()
                )),
                None => AppError::Database(format!("Database error: {}", db_err.message())),
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {}", col)),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use ezyq_core::ErrorKind;

    #[tokio::test]
    async fn test_check_and_unique_map_to_concurrency_violation() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let insert = "INSERT INTO queues (id, business_id, name, max_capacity, current_capacity, \
                      created_at, updated_at) VALUES (?, 'biz', 'Desk', 1, ?, 0, 0)";

        let err = sqlx::query(insert)
            .bind("q1")
            .bind(2)
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConcurrencyViolation);

        sqlx::query(insert).bind("q1").bind(0).execute(&pool).await.unwrap();
        let err = sqlx::query(insert)
            .bind("q1")
            .bind(0)
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConcurrencyViolation);
    }

    #[tokio::test]
    async fn test_other_errors_are_storage() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let err = sqlx::query("SELECT * FROM missing_table")
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
