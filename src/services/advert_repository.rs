use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::advert::{Advert, NewAdvertRecord};
use crate::models::advertiser::Advertiser;
use crate::models::location::{Category, Location};
use crate::models::order::{LinkedOrderItem, Order, OrderItem};
use crate::models::subuser::Subuser;
use crate::services::advert_query::{build_list_query, build_states_query, AdvertFilter, ADVERT_COLUMNS};

/// Storage the advert lifecycle needs. Each call is its own atomic unit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvertRepository: Send + Sync {
    async fn insert(&self, record: NewAdvertRecord) -> Result<Advert>;

    async fn find(&self, id: i64) -> Result<Advert>;

    async fn update(&self, advert: &Advert) -> Result<Advert>;

    async fn list(&self, filter: &AdvertFilter, now: DateTime<Utc>) -> Result<Vec<Advert>>;

    async fn location_states(&self, filter: &AdvertFilter, now: DateTime<Utc>) -> Result<Vec<String>>;

    async fn find_location(&self, id: i64) -> Result<Location>;

    async fn find_category(&self, id: i64) -> Result<Category>;

    async fn find_advertiser(&self, id: i64) -> Result<Option<Advertiser>>;

    async fn find_subuser(&self, id: i64) -> Result<Option<Subuser>>;

    /// Order items of an advert with their orders, earliest first.
    async fn linked_order_items(&self, advert_id: i64) -> Result<Vec<LinkedOrderItem>>;

    /// Completion time of the latest completed order buying `action` for the advert.
    async fn last_completed_at_for_action(
        &self,
        advert_id: i64,
        action: &str,
    ) -> Result<Option<DateTime<Utc>>>;

    async fn cache_short_url(&self, advert_id: i64, url: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct PgAdvertRepository {
    pool: PgPool,
}

impl PgAdvertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkedOrderItemRow {
    #[sqlx(flatten)]
    item: OrderItem,
    linked_order_id: Option<i64>,
    order_advertiser_id: Option<i64>,
    order_subuser_id: Option<i64>,
    order_company_name: Option<String>,
    order_completed_at: Option<DateTime<Utc>>,
    order_created_at: Option<DateTime<Utc>>,
}

impl From<LinkedOrderItemRow> for LinkedOrderItem {
    fn from(row: LinkedOrderItemRow) -> Self {
        let order = match (row.linked_order_id, row.order_created_at) {
            (Some(id), Some(created_at)) => Some(Order {
                id,
                advertiser_id: row.order_advertiser_id,
                subuser_id: row.order_subuser_id,
                company_name: row.order_company_name,
                completed_at: row.order_completed_at,
                created_at,
            }),
            _ => None,
        };
        LinkedOrderItem {
            item: row.item,
            order,
        }
    }
}

#[async_trait]
impl AdvertRepository for PgAdvertRepository {
    async fn insert(&self, record: NewAdvertRecord) -> Result<Advert> {
        let mut tx = self.pool.begin().await?;

        let advert = sqlx::query_as::<_, Advert>(&format!(
            r#"
            INSERT INTO adverts (
                reference, job_title, job_type, description, telephone,
                submitters_forename, submitters_surname, email, password_digest,
                advert_date, active_until
            ) VALUES (
                $1,$2,$3,$4,$5,
                $6,$7,$8,$9,
                $10,$11
            )
            RETURNING {}
            "#,
            ADVERT_COLUMNS
        ))
        .bind(&record.reference)
        .bind(&record.job_title)
        .bind(record.job_type.as_str())
        .bind(&record.description)
        .bind(&record.telephone)
        .bind(&record.submitters_forename)
        .bind(&record.submitters_surname)
        .bind(&record.email)
        .bind(&record.password_digest)
        .bind(record.advert_date)
        .bind(record.active_until)
        .fetch_one(&mut *tx)
        .await?;

        for location_id in &record.location_ids {
            sqlx::query("INSERT INTO adverts_locations (advert_id, location_id) VALUES ($1, $2)")
                .bind(advert.id)
                .bind(location_id)
                .execute(&mut *tx)
                .await?;
        }
        for category_id in &record.category_ids {
            sqlx::query("INSERT INTO adverts_categories (advert_id, category_id) VALUES ($1, $2)")
                .bind(advert.id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(advert)
    }

    async fn find(&self, id: i64) -> Result<Advert> {
        let advert = sqlx::query_as::<_, Advert>(&format!(
            "SELECT {} FROM adverts WHERE adverts.id = $1",
            ADVERT_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(advert)
    }

    async fn update(&self, advert: &Advert) -> Result<Advert> {
        let updated = sqlx::query_as::<_, Advert>(&format!(
            r#"
            UPDATE adverts
            SET
                reference = $2,
                job_title = $3,
                job_type = $4,
                description = $5,
                telephone = $6,
                submitters_forename = $7,
                submitters_surname = $8,
                advert_date = $9,
                live_at = $10,
                active_until = $11,
                premium_until = $12,
                archived = $13,
                approved = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ADVERT_COLUMNS
        ))
        .bind(advert.id)
        .bind(&advert.reference)
        .bind(&advert.job_title)
        .bind(advert.job_type.as_str())
        .bind(&advert.description)
        .bind(&advert.telephone)
        .bind(&advert.submitters_forename)
        .bind(&advert.submitters_surname)
        .bind(advert.advert_date)
        .bind(advert.live_at)
        .bind(advert.active_until)
        .bind(advert.premium_until)
        .bind(advert.archived)
        .bind(advert.approved)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn list(&self, filter: &AdvertFilter, now: DateTime<Utc>) -> Result<Vec<Advert>> {
        let mut builder = build_list_query(filter, now)?;
        let items = builder
            .build_query_as::<Advert>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn location_states(&self, filter: &AdvertFilter, now: DateTime<Utc>) -> Result<Vec<String>> {
        let mut builder = build_states_query(filter, now)?;
        let states = builder
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await?;
        Ok(states)
    }

    async fn find_location(&self, id: i64) -> Result<Location> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, name, state, lft, rgt FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }

    async fn find_category(&self, id: i64) -> Result<Category> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, lft, rgt FROM categories WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(category)
    }

    async fn find_advertiser(&self, id: i64) -> Result<Option<Advertiser>> {
        let advertiser = sqlx::query_as::<_, Advertiser>(
            "SELECT id, email, forename, surname, company_name, created_at FROM advertisers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(advertiser)
    }

    async fn find_subuser(&self, id: i64) -> Result<Option<Subuser>> {
        let subuser = sqlx::query_as::<_, Subuser>(
            "SELECT id, advertiser_id, email, name, created_at FROM subusers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subuser)
    }

    async fn linked_order_items(&self, advert_id: i64) -> Result<Vec<LinkedOrderItem>> {
        let rows = sqlx::query_as::<_, LinkedOrderItemRow>(
            r#"
            SELECT
                oi.id, oi.order_id, oi.product_id, oi.advert_id, oi.created_at,
                o.id AS linked_order_id,
                o.advertiser_id AS order_advertiser_id,
                o.subuser_id AS order_subuser_id,
                o.company_name AS order_company_name,
                o.completed_at AS order_completed_at,
                o.created_at AS order_created_at
            FROM order_items oi
            LEFT JOIN orders o ON o.id = oi.order_id
            WHERE oi.advert_id = $1
            ORDER BY oi.created_at ASC, oi.id ASC
            "#,
        )
        .bind(advert_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn last_completed_at_for_action(
        &self,
        advert_id: i64,
        action: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let completed_at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            r#"
            SELECT o.completed_at
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE oi.advert_id = $1
              AND p.action = $2
              AND o.completed_at IS NOT NULL
            ORDER BY o.completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(advert_id)
        .bind(action)
        .fetch_optional(&self.pool)
        .await?;
        Ok(completed_at.flatten())
    }

    async fn cache_short_url(&self, advert_id: i64, url: &str) -> Result<()> {
        sqlx::query("UPDATE adverts SET bitly_url_cache = $2, updated_at = NOW() WHERE id = $1")
            .bind(advert_id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
