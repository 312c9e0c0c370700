use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use intake_core::{
    Circuit, CreatedDocument, CustomerVendor, DocumentCreateRequest, DocumentRepository,
    DocumentType, NewSubType, RepositoryError, ResponsibilityCentre, SubType, TierType,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use crate::dates::{date_to_sql, get_date};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open `connection_string` (a file path, a `sqlite:` URL or
    /// `:memory:`), creating the file if it does not exist.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)
            .with_context(|| format!("Invalid SQLite connection string: {}", connection_string))?
            .create_if_missing(true);

        // An in-memory database lives and dies with its connection.
        let pool_options = if connection_string.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_document_type(row: &SqliteRow) -> Result<DocumentType, RepositoryError> {
    let tier_str: String = row.try_get("tier_type").map_err(db_err)?;
    let tier_type = TierType::parse(&tier_str)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid tier type: {}", tier_str)))?;

    Ok(DocumentType {
        id: row.try_get("id").map_err(db_err)?,
        type_name: row.try_get("type_name").map_err(db_err)?,
        type_key: row.try_get("type_key").map_err(db_err)?,
        tier_type,
    })
}

fn row_to_sub_type(row: &SqliteRow) -> Result<SubType, RepositoryError> {
    Ok(SubType {
        id: row.try_get("id").map_err(db_err)?,
        document_type_id: row.try_get("document_type_id").map_err(db_err)?,
        sub_type_key: row.try_get("sub_type_key").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        start_date: get_date(row, "start_date")?,
        end_date: get_date(row, "end_date")?,
        is_active: row.try_get("is_active").map_err(db_err)?,
    })
}

fn row_to_circuit(row: &SqliteRow) -> Result<Circuit, RepositoryError> {
    Ok(Circuit {
        id: row.try_get("id").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        circuit_key: row.try_get("circuit_key").map_err(db_err)?,
        descriptif: row.try_get("descriptif").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        document_type_id: row.try_get("document_type_id").map_err(db_err)?,
    })
}

/// Shared by customers (`code`) and vendors (`vendor_code`); the other code
/// stays `None`.
fn row_to_customer_vendor(
    row: &SqliteRow,
    tier: TierType,
) -> Result<CustomerVendor, RepositoryError> {
    let mut entity = CustomerVendor {
        name: row.try_get("name").map_err(db_err)?,
        address: row.try_get("address").map_err(db_err)?,
        city: row.try_get("city").map_err(db_err)?,
        country: row.try_get("country").map_err(db_err)?,
        ..Default::default()
    };
    match tier {
        TierType::Customer => entity.code = Some(row.try_get("code").map_err(db_err)?),
        TierType::Vendor => entity.vendor_code = Some(row.try_get("vendor_code").map_err(db_err)?),
        TierType::None => {}
    }
    Ok(entity)
}

#[async_trait]
impl DocumentRepository for SqliteRepository {
    async fn list_document_types(&self) -> Result<Vec<DocumentType>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, type_name, type_key, tier_type FROM document_types ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        rows.iter().map(row_to_document_type).collect()
    }

    async fn get_document_type(
        &self,
        id: i64,
    ) -> Result<DocumentType, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, type_name, type_key, tier_type FROM document_types WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_document_type(&row)
    }

    async fn get_document_type_by_key(
        &self,
        key: &str,
    ) -> Result<DocumentType, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, type_name, type_key, tier_type FROM document_types WHERE type_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_document_type(&row)
    }

    async fn list_sub_types(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SubType>, RepositoryError> {
        let day = date_to_sql(date);
        let rows = sqlx::query(
            "SELECT id, document_type_id, sub_type_key, name, start_date, end_date, is_active
             FROM sub_types
             WHERE document_type_id = ?
               AND is_active = 1
               AND date(start_date) <= date(?)
               AND date(end_date) >= date(?)
             ORDER BY start_date, id",
        )
        .bind(type_id)
        .bind(&day)
        .bind(&day)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_sub_type).collect()
    }

    async fn delete_sub_types(
        &self,
        type_id: i64,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sub_types WHERE document_type_id = ?")
            .bind(type_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected())
    }

    async fn insert_sub_type(
        &self,
        sub_type: &NewSubType,
    ) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO sub_types (document_type_id, sub_type_key, name, start_date, end_date, is_active)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(sub_type.document_type_id)
        .bind(&sub_type.sub_type_key)
        .bind(&sub_type.name)
        .bind(date_to_sql(sub_type.start_date))
        .bind(date_to_sql(sub_type.end_date))
        .bind(sub_type.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_circuits(&self) -> Result<Vec<Circuit>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, title, circuit_key, descriptif, is_active, document_type_id
             FROM circuits ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_circuit).collect()
    }

    async fn list_customers(&self) -> Result<Vec<CustomerVendor>, RepositoryError> {
        let rows =
            sqlx::query("SELECT code, name, address, city, country FROM customers ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        rows.iter()
            .map(|row| row_to_customer_vendor(row, TierType::Customer))
            .collect()
    }

    async fn list_vendors(&self) -> Result<Vec<CustomerVendor>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT vendor_code, name, address, city, country FROM vendors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| row_to_customer_vendor(row, TierType::Vendor))
            .collect()
    }

    async fn list_responsibility_centres(
        &self,
    ) -> Result<Vec<ResponsibilityCentre>, RepositoryError> {
        let rows = sqlx::query("SELECT id, code, descr FROM responsibility_centres ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut centres = Vec::with_capacity(rows.len());
        for row in rows {
            centres.push(ResponsibilityCentre {
                id: row.try_get("id").map_err(db_err)?,
                code: row.try_get("code").map_err(db_err)?,
                descr: row.try_get("descr").map_err(db_err)?,
            });
        }
        Ok(centres)
    }

    async fn create_document(
        &self,
        request: &DocumentCreateRequest,
    ) -> Result<CreatedDocument, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO documents (
                responsibility_centre_id, type_id, sub_type_id, title,
                document_alias, document_externe, doc_date, comptable_date,
                content, circuit_id, customer_vendor_code, customer_vendor_name,
                customer_vendor_address, customer_vendor_city, customer_vendor_country,
                created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(request.responsibility_centre_id)
        .bind(request.type_id)
        .bind(request.sub_type_id)
        .bind(&request.title)
        .bind(&request.document_alias)
        .bind(&request.document_externe)
        .bind(date_to_sql(request.doc_date))
        .bind(request.comptable_date.map(date_to_sql))
        .bind(&request.content)
        .bind(request.circuit_id)
        .bind(&request.customer_vendor_code)
        .bind(&request.customer_vendor_name)
        .bind(&request.customer_vendor_address)
        .bind(&request.customer_vendor_city)
        .bind(&request.customer_vendor_country)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        debug!(document_id = id, type_id = request.type_id, "document stored");

        Ok(CreatedDocument {
            id,
            title: request.title.clone(),
            circuit_id: request.circuit_id,
        })
    }
}
