//! Report record types and the row scanners that build them.
//!
//! Each scanner reads a fixed, ordered set of columns from one result
//! row. [`scan_rows`] drives a scanner over a whole result stream; any
//! decode or cursor error aborts the scan, so callers never see a
//! partial result.

use futures::{Stream, TryStreamExt};
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// A row scanner: decodes one result row into a report record.
pub type ScanFn = fn(&SqliteRow) -> Result<ReportRow, sqlx::Error>;

/// Daily average utilization of a rate series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverageRecord {
    /// Mean utilization over the day.
    pub avg_util: f64,
    /// ISO date (`YYYY-MM-DD`).
    pub day: String,
    /// Number of samples aggregated.
    pub n: i64,
}

/// Daily open/high/low/close of a quote series.
///
/// `open` and `close` are `None` for a day without ranked rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOhlcRecord {
    /// First mid quote of the day.
    pub open: Option<f64>,
    /// Highest mid quote.
    pub high: f64,
    /// Lowest mid quote.
    pub low: f64,
    /// Last mid quote of the day.
    pub close: Option<f64>,
    /// ISO date (`YYYY-MM-DD`).
    pub day: String,
    /// Number of quotes aggregated.
    pub n: i64,
}

/// One record of any report, serialized as the bare record object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportRow {
    /// A `daily_average` record.
    DailyAverage(DailyAverageRecord),
    /// A `daily_ohlc` record.
    DailyOhlc(DailyOhlcRecord),
}

/// Scan `avg_util, day, n`.
///
/// # Errors
///
/// Returns the decode error of the first bad column.
pub fn scan_daily_average(row: &SqliteRow) -> Result<ReportRow, sqlx::Error> {
    Ok(ReportRow::DailyAverage(DailyAverageRecord {
        avg_util: required_real(row, 0)?,
        day: required_text(row, 1)?,
        n: row.try_get(2)?,
    }))
}

/// Scan `open, high, low, close, day, n`.
///
/// # Errors
///
/// Returns the decode error of the first bad column.
pub fn scan_daily_ohlc(row: &SqliteRow) -> Result<ReportRow, sqlx::Error> {
    Ok(ReportRow::DailyOhlc(DailyOhlcRecord {
        open: real(row, 0)?,
        high: required_real(row, 1)?,
        low: required_real(row, 2)?,
        close: real(row, 3)?,
        day: required_text(row, 4)?,
        n: row.try_get(5)?,
    }))
}

/// Drive `scan` over every row of `rows`.
///
/// `capacity` is only an allocation hint.
///
/// # Errors
///
/// Returns the first cursor or decode error; no partial result is kept.
pub async fn scan_rows<S>(
    mut rows: S,
    scan: ScanFn,
    capacity: usize,
) -> Result<Vec<ReportRow>, sqlx::Error>
where
    S: Stream<Item = Result<SqliteRow, sqlx::Error>> + Unpin,
{
    let mut records = Vec::with_capacity(capacity);
    while let Some(row) = rows.try_next().await? {
        records.push(scan(&row)?);
    }
    Ok(records)
}

/// Decode a nullable numeric column as `f64`.
///
/// Aggregates over integer-typed columns come back as `INTEGER`, so the
/// declared-type check is skipped and `SQLite` converts the value.
fn real(row: &SqliteRow, index: usize) -> Result<Option<f64>, sqlx::Error> {
    row.try_get_unchecked::<Option<f64>, _>(index)
}

/// Decode a numeric column that must not be `NULL`.
fn required_real(row: &SqliteRow, index: usize) -> Result<f64, sqlx::Error> {
    real(row, index)?.ok_or_else(|| unexpected_null(index))
}

/// Decode a text column that must not be `NULL`.
///
/// `date()` yields `NULL` for a malformed timestamp; the driver would
/// otherwise decode that as an empty string.
fn required_text(row: &SqliteRow, index: usize) -> Result<String, sqlx::Error> {
    row.try_get::<Option<String>, _>(index)?
        .ok_or_else(|| unexpected_null(index))
}

fn unexpected_null(index: usize) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: "unexpected NULL in non-nullable column".into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use futures::stream;
    use sqlx::{Connection, SqliteConnection};

    use super::*;

    async fn rows_for(sql: &str) -> Vec<SqliteRow> {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::query(sql).fetch_all(&mut conn).await.unwrap()
    }

    #[tokio::test]
    async fn daily_average_reads_three_columns() {
        let rows = rows_for("SELECT 0.25 AS avg_util, '2025-11-15' AS day, 4 AS n").await;
        let record = scan_daily_average(&rows[0]).unwrap();
        assert_eq!(
            record,
            ReportRow::DailyAverage(DailyAverageRecord {
                avg_util: 0.25,
                day: String::from("2025-11-15"),
                n: 4,
            })
        );
    }

    #[tokio::test]
    async fn integer_aggregates_decode_as_real() {
        let rows = rows_for("SELECT 3, '2025-11-15', 1").await;
        let ReportRow::DailyAverage(record) = scan_daily_average(&rows[0]).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(record.avg_util, 3.0);
    }

    #[tokio::test]
    async fn ohlc_keeps_null_open_and_close() {
        let rows = rows_for("SELECT NULL, 2.0, 1.0, NULL, '2025-11-16', 7").await;
        let ReportRow::DailyOhlc(record) = scan_daily_ohlc(&rows[0]).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(record.open, None);
        assert_eq!(record.close, None);
        assert_eq!(record.high, 2.0);
        assert_eq!(record.n, 7);
    }

    #[tokio::test]
    async fn ohlc_rejects_null_high() {
        let rows = rows_for("SELECT 1.0, NULL, 1.0, 1.0, '2025-11-16', 1").await;
        assert!(scan_daily_ohlc(&rows[0]).is_err());
    }

    #[tokio::test]
    async fn null_day_is_an_error() {
        let rows = rows_for("SELECT 0.5, date('2025-11-20x'), 1").await;
        assert!(scan_daily_average(&rows[0]).is_err());
    }

    #[tokio::test]
    async fn wrong_column_type_is_an_error() {
        let rows = rows_for("SELECT 0.5, '2025-11-15', 'many'").await;
        assert!(scan_daily_average(&rows[0]).is_err());
    }

    #[tokio::test]
    async fn scan_rows_collects_in_order() {
        let rows = rows_for(
            "SELECT 0.1, '2025-11-15', 1 UNION ALL SELECT 0.2, '2025-11-16', 2",
        )
        .await;
        let records = scan_rows(stream::iter(rows.into_iter().map(Ok)), scan_daily_average, 90)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(
            json,
            r#"[{"avg_util":0.1,"day":"2025-11-15","n":1},{"avg_util":0.2,"day":"2025-11-16","n":2}]"#
        );
    }

    #[tokio::test]
    async fn scan_rows_aborts_on_cursor_error() {
        let rows = rows_for("SELECT 0.1, '2025-11-15', 1").await;
        let items = rows
            .into_iter()
            .map(Ok)
            .chain(std::iter::once(Err(sqlx::Error::RowNotFound)));
        let result = scan_rows(stream::iter(items), scan_daily_average, 90).await;
        assert!(result.is_err());
    }

    #[test]
    fn ohlc_serializes_null_fields() {
        let row = ReportRow::DailyOhlc(DailyOhlcRecord {
            open: None,
            high: 2.0,
            low: 1.0,
            close: Some(1.5),
            day: String::from("2025-11-16"),
            n: 3,
        });
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"open":null,"high":2.0,"low":1.0,"close":1.5,"day":"2025-11-16","n":3}"#
        );
    }
}
