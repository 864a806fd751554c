use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::DatabaseConfig;
use crate::core::database;
use crate::features::records::models::{
    Country, Gender, Hobby, NewRecord, Record, RecordFields, RecordFilter, UnknownChoice,
};
use crate::features::records::store::{RecordStore, StoreError, StoreResult};

/// Database row of the `modelfield` table
#[derive(Debug, Clone, FromRow)]
struct RecordRow {
    id: Uuid,
    name: String,
    email: String,
    password: Option<String>,
    gender: String,
    dob: NaiveDate,
    country: String,
    hobbies: Vec<String>,
    message: String,
    file: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for Record {
    type Error = UnknownChoice;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let hobbies = row
            .hobbies
            .iter()
            .map(|h| Hobby::parse(h))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Record {
            id: row.id,
            fields: RecordFields {
                name: row.name,
                email: row.email,
                password: row.password,
                gender: Gender::parse(&row.gender)?,
                dob: row.dob,
                country: Country::parse(&row.country)?,
                hobbies,
                message: row.message,
            },
            file: row.file,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, name, email, password, gender, dob, country, hobbies, message, file, created_at";

/// Escape `%`, `_` and `\` so a search term matches literally inside ILIKE
fn like_pattern(filter: &RecordFilter) -> Option<String> {
    filter.search.as_ref().map(|term| {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

fn hobby_strings(hobbies: &[Hobby]) -> Vec<String> {
    hobbies.iter().map(|h| h.as_str().to_string()).collect()
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// PostgreSQL-backed record store.
///
/// The pool is created and migrated on first use rather than at startup, so
/// the service boots without a reachable database. A failed connection
/// attempt leaves the cell empty and is retried by the next request.
pub struct PgRecordStore {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl PgRecordStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> StoreResult<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let pool = database::create_pool(&self.config).await.map_err(|e| {
                    tracing::warn!(
                        "Failed to connect to {}: {}",
                        self.config.redacted_url(),
                        e
                    );
                    StoreError::Unavailable(e.to_string())
                })?;
                info!("Database connection pool created");

                database::run_migrations(&pool).await.map_err(|e| {
                    tracing::error!("Migration failed: {}", e);
                    StoreError::Unavailable(format!("migration failed: {}", e))
                })?;
                info!("Database migrations completed successfully");

                Ok(pool)
            })
            .await
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: NewRecord) -> StoreResult<Uuid> {
        let pool = self.pool().await?;
        let fields = record.fields;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO modelfield (id, name, email, password, gender, dob, country, hobbies, message, file)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.password)
        .bind(fields.gender.as_str())
        .bind(fields.dob)
        .bind(fields.country.code())
        .bind(hobby_strings(&fields.hobbies))
        .bind(&fields.message)
        .bind(&record.file)
        .fetch_one(pool)
        .await?;

        debug!("Inserted record {}", id);
        Ok(id)
    }

    async fn update_by_id(&self, id: Uuid, fields: &RecordFields) -> StoreResult<bool> {
        let pool = self.pool().await?;

        let result = sqlx::query(
            r#"
            UPDATE modelfield
            SET name = $2, email = $3, password = COALESCE($4, password), gender = $5,
                dob = $6, country = $7, hobbies = $8, message = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.password)
        .bind(fields.gender.as_str())
        .bind(fields.dob)
        .bind(fields.country.code())
        .bind(hobby_strings(&fields.hobbies))
        .bind(&fields.message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<u64> {
        let pool = self.pool().await?;

        let result = sqlx::query("DELETE FROM modelfield WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Record>> {
        let pool = self.pool().await?;

        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {} FROM modelfield WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(Record::try_from)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("record {}: {}", id, e)))
    }

    async fn count(&self, filter: &RecordFilter) -> StoreResult<u64> {
        let pool = self.pool().await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM modelfield
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
            "#,
        )
        .bind(like_pattern(filter))
        .fetch_one(pool)
        .await?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn find_page(
        &self,
        filter: &RecordFilter,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<Record>> {
        let pool = self.pool().await?;

        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {} FROM modelfield
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
            SELECT_COLUMNS
        ))
        .bind(like_pattern(filter))
        .bind(to_i64(limit))
        .bind(to_i64(skip))
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                Record::try_from(row)
                    .map_err(|e| StoreError::Corrupt(format!("record {}: {}", id, e)))
            })
            .collect()
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Database connection pool closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RecordRow {
        RecordRow {
            id: Uuid::now_v7(),
            name: "Grace".into(),
            email: "grace@example.com".into(),
            password: None,
            gender: "not specified".into(),
            dob: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            country: "US".into(),
            hobbies: vec!["reading".into(), "sports".into(), "music".into()],
            message: "Hello world".into(),
            file: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_into_record() {
        let record = Record::try_from(row()).unwrap();
        assert_eq!(record.fields.gender, Gender::NotSpecified);
        assert_eq!(record.fields.country, Country::UnitedStates);
        assert_eq!(
            record.fields.hobbies,
            vec![Hobby::Reading, Hobby::Sports, Hobby::Music]
        );
    }

    #[test]
    fn test_row_with_unknown_hobby_is_rejected() {
        let mut row = row();
        row.hobbies.push("knitting".into());
        assert!(Record::try_from(row).is_err());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(&RecordFilter::default()), None);
        assert_eq!(
            like_pattern(&RecordFilter::search(Some("50%_a\\b"))),
            Some("%50\\%\\_a\\\\b%".to_string())
        );
    }

    #[test]
    fn test_unreachable_errors_map_to_unavailable() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_unavailable());
        assert!(!StoreError::from(sqlx::Error::RowNotFound).is_unavailable());
    }
}
