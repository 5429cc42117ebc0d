//! Warehouse access

mod catalog;
mod schema;
pub mod seed;
mod table;

pub use catalog::QueryId;
pub use table::{format_number, Cell, Table, TableError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Pool, Row, Sqlite, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use crate::config::WarehouseConfig;

/// A risk-scored destination country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub dial_code: String,
    pub risk_score: i64,
}

impl Country {
    pub fn new(name: &str, dial_code: &str, risk_score: i64) -> Self {
        Self {
            name: name.to_string(),
            dial_code: dial_code.to_string(),
            risk_score,
        }
    }
}

/// One enriched call detail record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdrRecord {
    pub call_start: String,
    pub anum: String,
    pub bnum: String,
    pub b_country_code: Option<String>,
    pub country_name: String,
    pub country_risk_score: i64,
    pub direction: String,
    pub cdr_type: String,
    pub rate: f64,
    /// Milliseconds
    pub duration: i64,
}

impl CdrRecord {
    pub fn voice(bnum: &str, country: &Country) -> Self {
        Self {
            call_start: String::new(),
            anum: String::new(),
            bnum: bnum.to_string(),
            b_country_code: Some(country.dial_code.clone()),
            country_name: country.name.clone(),
            country_risk_score: country.risk_score,
            direction: "Outgoing".to_string(),
            cdr_type: "Voice".to_string(),
            rate: 0.0,
            duration: 0,
        }
    }

    pub fn sms(bnum: &str, country: &Country) -> Self {
        Self {
            direction: "Incoming".to_string(),
            cdr_type: "SMS".to_string(),
            ..Self::voice(bnum, country)
        }
    }

    pub fn with_direction(mut self, direction: &str) -> Self {
        self.direction = direction.to_string();
        self
    }

    pub fn with_billing(mut self, rate: f64, duration_ms: i64) -> Self {
        self.rate = rate;
        self.duration = duration_ms;
        self
    }

    pub fn with_parties(mut self, anum: String, call_start: String) -> Self {
        self.anum = anum;
        self.call_start = call_start;
        self
    }
}

/// Handle to the warehouse. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Warehouse {
    pool: Pool<Sqlite>,
}

impl Warehouse {
    pub async fn new(config: &WarehouseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.url))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.url == ":memory:" {
            // Every connection would otherwise see its own empty database
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;

        sqlx::query(schema::CREATE_COUNTRY_CODE)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_CDRS_ENRICHED)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_INDEX_VOICE)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_INDEX_BNUM)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Run one query and materialize the whole result set.
    ///
    /// Columns come from the prepared statement, so an empty result still
    /// carries its output aliases. Errors propagate as-is: no retry, no
    /// partial result.
    pub async fn fetch(&self, sql: &str) -> Result<Table> {
        let statement = (&self.pool).prepare(sql).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = statement.query().fetch_all(&self.pool).await?;
        let rows = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| decode_cell(row, i))
                    .collect::<Result<Vec<Cell>>>()
            })
            .collect::<Result<Vec<Vec<Cell>>>>()?;

        Ok(Table::new(columns, rows))
    }

    /// Run a catalog query
    pub async fn fetch_query(&self, id: QueryId) -> Result<Table> {
        let started = Instant::now();
        let table = self
            .fetch(id.sql())
            .await
            .with_context(|| format!("query {} failed", id.name()))?;
        debug!(
            query = id.name(),
            rows = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched table"
        );
        Ok(table)
    }

    pub async fn insert_countries(&self, countries: &[Country]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for country in countries {
            let result = sqlx::query(
                "INSERT OR REPLACE INTO COUNTRY_CODE (COUNTRY_NAME, COUNTRY_CODE, RISK_SCORE) VALUES (?, ?, ?)",
            )
            .bind(&country.name)
            .bind(&country.dial_code)
            .bind(country.risk_score)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Insert records in a single transaction
    pub async fn insert_cdrs(&self, records: &[CdrRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO CDRS_ENRICHED (CALL_START, ANUM, BNUM, B_COUNTRY_CODE, COUNTRY_NAME, COUNTRY_RISK_SCORE, CDR_DIRECTION, CDR_TYPE, RATE, DURATION)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.call_start)
            .bind(&record.anum)
            .bind(&record.bnum)
            .bind(&record.b_country_code)
            .bind(&record.country_name)
            .bind(record.country_risk_score)
            .bind(&record.direction)
            .bind(&record.cdr_type)
            .bind(record.rate)
            .bind(record.duration)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn cdr_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM CDRS_ENRICHED")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

/// Decode by the value's runtime storage class, not the declared column type
fn decode_cell(row: &SqliteRow, index: usize) -> Result<Cell> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Cell::Null);
    }
    let cell = match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => Cell::Integer(row.try_get_unchecked(index)?),
        "REAL" | "NUMERIC" => Cell::Real(row.try_get_unchecked(index)?),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get_unchecked(index)?;
            Cell::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Cell::Text(row.try_get_unchecked(index)?),
    };
    Ok(cell)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn names(table: &Table, column: &str) -> Vec<String> {
        table.column(column).unwrap().iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn top5_country_single_row_example() {
        let warehouse = memory_warehouse().await;
        let country_x = Country::new("Country X", "999", 5);
        warehouse
            .insert_cdrs(&[CdrRecord::voice("99912345", &country_x).with_billing(2.0, 60_000)])
            .await
            .unwrap();

        let table = warehouse.fetch_query(QueryId::Top5Country).await.unwrap();
        assert_eq!(
            table.columns,
            vec!["COUNTRYNAME", "TOTALCOUNT", "TOTALRATE", "TOTALDURATION"]
        );
        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row[0], Cell::Text("Country X".into()));
        assert_eq!(row[1], Cell::Integer(1));
        assert_eq!(row[2].as_f64(), Some(2.0));
        assert_eq!(row[3].as_f64(), Some(60.0));
    }

    #[tokio::test]
    async fn top5_country_skips_unbilled_incoming_and_low_risk() {
        let warehouse = fixture_warehouse().await;
        let table = warehouse.fetch_query(QueryId::Top5Country).await.unwrap();

        assert_eq!(names(&table, "COUNTRYNAME"), vec!["Cuba", "Latvia"]);
        assert_eq!(table.numeric_column("TOTALCOUNT").unwrap(), vec![3.0, 1.0]);
        assert_eq!(table.numeric_column("TOTALRATE").unwrap(), vec![4.5, 2.0]);
        assert_eq!(table.numeric_column("TOTALDURATION").unwrap(), vec![90.0, 60.0]);
    }

    #[tokio::test]
    async fn risk_country_labels_medium_and_high() {
        let warehouse = fixture_warehouse().await;
        let table = warehouse.fetch_query(QueryId::RiskCountry).await.unwrap();

        assert_eq!(table.columns, vec!["COUNTRYNAME", "RISKSCORE"]);
        assert_eq!(names(&table, "COUNTRYNAME"), vec!["Cuba", "Latvia"]);
        assert_eq!(names(&table, "RISKSCORE"), vec!["High", "Medium"]);
    }

    #[tokio::test]
    async fn top_called_numbers_ranked_by_count() {
        let warehouse = fixture_warehouse().await;
        let table = warehouse.fetch_query(QueryId::TopCalledNumbers).await.unwrap();

        assert_eq!(
            table.columns,
            vec!["BNUMBER", "COUNTRYCODE", "COUNTRYNAME", "TOTALCOUNT", "TOTALRATE", "TOTALDURATION"]
        );
        // Unbilled calls count here; incoming and low-risk do not
        assert_eq!(names(&table, "BNUMBER"), vec!["5355501", "37120001", "5355502"]);
        assert_eq!(names(&table, "TOTALCOUNT"), vec!["3", "1", "1"]);
        // Raw milliseconds, no scaling
        assert_eq!(table.numeric_column("TOTALDURATION").unwrap(), vec![90_000.0, 60_000.0, 10_000.0]);
    }

    #[tokio::test]
    async fn top_called_numbers_limited_to_100() {
        let warehouse = memory_warehouse().await;
        let cuba = Country::new("Cuba", "53", 5);
        let records: Vec<CdrRecord> = (0..150)
            .map(|i| CdrRecord::voice(&format!("53{:05}", i), &cuba))
            .collect();
        warehouse.insert_cdrs(&records).await.unwrap();

        let table = warehouse.fetch_query(QueryId::TopCalledNumbers).await.unwrap();
        assert_eq!(table.len(), 100);
    }

    #[tokio::test]
    async fn sms_by_country_only_low_risk_sorted_desc() {
        let warehouse = fixture_warehouse().await;
        let table = warehouse.fetch_query(QueryId::SmsByCountry).await.unwrap();

        assert_eq!(table.columns, vec!["COUNTRYNAME", "TOTALCOUNT"]);
        assert_eq!(names(&table, "COUNTRYNAME"), vec!["France", "Spain"]);
        assert_eq!(names(&table, "TOTALCOUNT"), vec!["120", "99"]);
    }

    #[tokio::test]
    async fn sms_spamming_applies_threshold() {
        let warehouse = fixture_warehouse().await;
        let table = warehouse.fetch_query(QueryId::SmsSpamming).await.unwrap();

        assert_eq!(table.columns, vec!["BNUMBER", "COUNTRYCODE", "COUNTRYNAME", "TOTALCOUNT"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Text("33600001".into()));
        assert_eq!(table.rows[0][1], Cell::Text("33".into()));
        assert_eq!(table.rows[0][3], Cell::Integer(120));

        let counts = table.numeric_column("TOTALCOUNT").unwrap();
        assert!(counts.iter().all(|c| *c >= 100.0));
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn sms_queries_include_risk_three_and_exactly_one_hundred() {
        let warehouse = memory_warehouse().await;
        let brazil = Country::new("Brazil", "55", 3);
        let tunisia = Country::new("Tunisia", "216", 4);
        warehouse
            .insert_countries(&[brazil.clone(), tunisia.clone()])
            .await
            .unwrap();

        let mut records = Vec::new();
        for _ in 0..100 {
            records.push(CdrRecord::sms("5500001", &brazil));
        }
        for _ in 0..99 {
            records.push(CdrRecord::sms("5500002", &brazil));
        }
        for _ in 0..150 {
            records.push(CdrRecord::sms("21600001", &tunisia));
        }
        warehouse.insert_cdrs(&records).await.unwrap();

        let by_country = warehouse.fetch_query(QueryId::SmsByCountry).await.unwrap();
        assert_eq!(names(&by_country, "COUNTRYNAME"), vec!["Brazil"]);
        assert_eq!(names(&by_country, "TOTALCOUNT"), vec!["199"]);

        let spam = warehouse.fetch_query(QueryId::SmsSpamming).await.unwrap();
        assert_eq!(names(&spam, "BNUMBER"), vec!["5500001"]);
        assert_eq!(names(&spam, "COUNTRYCODE"), vec!["55"]);
        assert_eq!(names(&spam, "TOTALCOUNT"), vec!["100"]);
    }

    #[tokio::test]
    async fn empty_result_keeps_column_names() {
        let warehouse = memory_warehouse().await;
        let table = warehouse.fetch_query(QueryId::SmsSpamming).await.unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 4);
    }

    #[tokio::test]
    async fn repeated_fetch_is_identical() {
        let warehouse = fixture_warehouse().await;
        for id in QueryId::ALL {
            let first = warehouse.fetch_query(id).await.unwrap();
            let second = warehouse.fetch_query(id).await.unwrap();
            assert_eq!(
                serde_json::to_vec(&first).unwrap(),
                serde_json::to_vec(&second).unwrap(),
                "{} changed between fetches",
                id.name()
            );
        }
    }

    #[tokio::test]
    async fn query_errors_propagate() {
        let warehouse = memory_warehouse().await;
        let err = warehouse.fetch("SELECT * FROM MISSING_TABLE").await.unwrap_err();
        assert!(err.to_string().contains("MISSING_TABLE"));
    }
}
