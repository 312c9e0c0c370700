use chrono::NaiveDate;
use intake_core::RepositoryError;
use intake_core::dates::parse_calendar_date;
use sqlx::Row;

/// Get a calendar date from a TEXT column, discarding any time-of-day part.
pub fn get_date(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<NaiveDate, RepositoryError> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    parse_calendar_date(&raw).map_err(|e| {
        RepositoryError::Database(format!("Invalid date in column '{}': {}", column, e))
    })
}

/// Convert a date to the TEXT form stored in SQLite.
pub fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
