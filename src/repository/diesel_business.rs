//! Diesel-based business store for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while keeping Diesel's compile-time query checking.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use uuid::Uuid;

use super::models::{BusinessRow, NewBusiness};
use super::pool::{DbError, DbPool, SqliteConn};
use super::util::{escape_like, slugify};
use super::{parse_datetime, BusinessStore, PersistenceError, StoredBusiness, UpsertOutcome};
use crate::models::{BusinessRecord, Category};
use crate::schema::businesses;
use crate::with_conn;

/// Status given to newly stored businesses.
pub const STATUS_ACTIVE: &str = "ACTIVE";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS businesses (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        description TEXT,
        category TEXT NOT NULL,
        subcategory TEXT,
        address TEXT NOT NULL,
        address_line2 TEXT,
        postcode TEXT,
        phone TEXT,
        email TEXT,
        website TEXT,
        opening_hours TEXT,
        services TEXT,
        specialties TEXT,
        latitude REAL,
        longitude REAL,
        source TEXT NOT NULL,
        source_url TEXT,
        status TEXT NOT NULL DEFAULT 'ACTIVE',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_businesses_name ON businesses(name);
    CREATE INDEX IF NOT EXISTS idx_businesses_category ON businesses(category);
"#;

/// Convert a database row to a stored business.
impl From<BusinessRow> for StoredBusiness {
    fn from(row: BusinessRow) -> Self {
        let record = BusinessRecord {
            name: row.name,
            description: row.description,
            category: Category::from_name(&row.category).unwrap_or_default(),
            subcategory: row.subcategory,
            address: row.address,
            address_line2: row.address_line2,
            postcode: row.postcode,
            phone: row.phone,
            email: row.email,
            website: row.website,
            opening_hours: row
                .opening_hours
                .and_then(|s| serde_json::from_str(&s).ok()),
            services: row
                .services
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            specialties: row
                .specialties
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            latitude: row.latitude,
            longitude: row.longitude,
            source: row.source,
            source_url: row.source_url,
        };

        StoredBusiness {
            id: row.id,
            slug: row.slug,
            status: row.status,
            created_at: parse_datetime(&row.created_at),
            record,
        }
    }
}

/// SQLite-backed [`BusinessStore`].
#[derive(Clone)]
pub struct DieselBusinessStore {
    pool: DbPool,
}

impl DieselBusinessStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the businesses table if it does not exist.
    pub async fn init_schema(&self) -> Result<(), PersistenceError> {
        with_conn!(self.pool, conn => {
            conn.batch_execute(SCHEMA).await?;
            Ok(())
        })
    }

    /// Every stored business, ordered by category then name.
    pub async fn list_all(&self) -> Result<Vec<StoredBusiness>, PersistenceError> {
        with_conn!(self.pool, conn => {
            let rows = businesses::table
                .order((businesses::category.asc(), businesses::name.asc()))
                .select(BusinessRow::as_select())
                .load(&mut conn)
                .await?;
            Ok(rows.into_iter().map(StoredBusiness::from).collect())
        })
    }

    pub async fn count(&self) -> Result<i64, PersistenceError> {
        with_conn!(self.pool, conn => {
            Ok(businesses::table.count().get_result(&mut conn).await?)
        })
    }

    /// Slug for `name`, suffixed with a counter if already taken.
    async fn unique_slug(conn: &mut SqliteConn, name: &str) -> Result<String, DbError> {
        let base = match slugify(name) {
            s if s.is_empty() => "business".to_string(),
            s => s,
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        loop {
            let taken: i64 = businesses::table
                .filter(businesses::slug.eq(&candidate))
                .count()
                .get_result(conn)
                .await?;
            if taken == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }
}

/// The fuzzy clause's name token, unless it is too generic to be useful.
fn fuzzy_name_token(name: &str) -> Option<&str> {
    let first = name.split_whitespace().next()?;
    (first.chars().count() >= 3 && !first.eq_ignore_ascii_case("the")).then_some(first)
}

#[async_trait]
impl BusinessStore for DieselBusinessStore {
    async fn find_existing(
        &self,
        name: &str,
        address_prefix: &str,
    ) -> Result<Option<StoredBusiness>, PersistenceError> {
        let address_prefix = address_prefix.trim();
        let fuzzy = fuzzy_name_token(name)
            .filter(|_| !address_prefix.is_empty())
            .map(|token| {
                (
                    format!("%{}%", escape_like(address_prefix)),
                    format!("%{}%", escape_like(token)),
                )
            });

        with_conn!(self.pool, conn => {
            let row = match fuzzy {
                Some((address_pattern, name_pattern)) => businesses::table
                    .filter(
                        businesses::name.eq(name).or(businesses::address
                            .like(address_pattern)
                            .escape('\\')
                            .and(businesses::name.like(name_pattern).escape('\\'))),
                    )
                    .order(businesses::created_at.asc())
                    .select(BusinessRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()?,
                None => businesses::table
                    .filter(businesses::name.eq(name))
                    .order(businesses::created_at.asc())
                    .select(BusinessRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()?,
            };
            Ok(row.map(StoredBusiness::from))
        })
    }

    async fn upsert(&self, record: &BusinessRecord) -> Result<UpsertOutcome, PersistenceError> {
        let opening_hours = record
            .opening_hours
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let services = (!record.services.is_empty())
            .then(|| serde_json::to_string(&record.services))
            .transpose()?;
        let specialties = (!record.specialties.is_empty())
            .then(|| serde_json::to_string(&record.specialties))
            .transpose()?;

        with_conn!(self.pool, conn => {
            let existing: Option<String> = businesses::table
                .filter(businesses::name.eq(&record.name))
                .filter(businesses::address.eq(&record.address))
                .select(businesses::id)
                .first(&mut conn)
                .await
                .optional()?;
            if let Some(existing_id) = existing {
                return Ok(UpsertOutcome::Skipped { existing_id });
            }

            let id = Uuid::new_v4().to_string();
            let slug = Self::unique_slug(&mut conn, &record.name).await?;
            let created_at = Utc::now().to_rfc3339();

            let new_business = NewBusiness {
                id: &id,
                name: &record.name,
                slug: &slug,
                description: record.description.as_deref(),
                category: record.category.as_str(),
                subcategory: record.subcategory.as_deref(),
                address: &record.address,
                address_line2: record.address_line2.as_deref(),
                postcode: record.postcode.as_deref(),
                phone: record.phone.as_deref(),
                email: record.email.as_deref(),
                website: record.website.as_deref(),
                opening_hours: opening_hours.as_deref(),
                services: services.as_deref(),
                specialties: specialties.as_deref(),
                latitude: record.latitude,
                longitude: record.longitude,
                source: &record.source,
                source_url: record.source_url.as_deref(),
                status: STATUS_ACTIVE,
                created_at: &created_at,
            };

            diesel::insert_into(businesses::table)
                .values(&new_business)
                .execute(&mut conn)
                .await?;

            Ok(UpsertOutcome::Created { id })
        })
    }
}
