//! Typed advert filters and their SQL rendering.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::dto::advert_dto::AdvertListQuery;
use crate::models::location::NestedSetRange;
use crate::error::{Error, Result};
use crate::utils::time::{days_ago, seconds_ago, start_of_minute};

pub const ADVERT_COLUMNS: &str = "adverts.id, adverts.reference, adverts.job_title, adverts.job_type, \
     adverts.description, adverts.telephone, adverts.submitters_forename, adverts.submitters_surname, \
     adverts.email, adverts.password_digest, adverts.advert_date, adverts.live_at, adverts.active_until, \
     adverts.premium_until, adverts.archived, adverts.approved, adverts.advertiser_id, adverts.subuser_id, \
     adverts.bitly_url_cache, adverts.created_at, adverts.updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityScope {
    /// Approved, unarchived and not yet expired.
    Active,
    /// Approved and expired.
    Inactive,
    InactiveOrArchived,
}

impl ActivityScope {
    pub fn from_flag(flag: &str) -> Self {
        if flag == "1" {
            ActivityScope::Active
        } else {
            ActivityScope::Inactive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumScope {
    Premium,
    Regular,
}

impl PremiumScope {
    pub fn from_flag(flag: &str) -> Self {
        if flag == "1" {
            PremiumScope::Premium
        } else {
            PremiumScope::Regular
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvertOrder {
    #[default]
    MostRecentFirst,
    MostPremiumFirst,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvertFilter {
    pub activity: Option<ActivityScope>,
    pub premium: Option<PremiumScope>,
    pub approved: Option<bool>,
    pub archived: Option<bool>,
    pub expired_yesterday: bool,
    pub premium_expired_yesterday: bool,
    pub live_within_seconds: Option<i64>,
    pub age_in_days: Option<i64>,
    pub location: Option<NestedSetRange>,
    pub category: Option<NestedSetRange>,
    pub advertiser_id: Option<i64>,
    pub subuser_id: Option<i64>,
    pub unowned: bool,
    pub order: AdvertOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AdvertFilter {
    pub fn active() -> Self {
        Self {
            activity: Some(ActivityScope::Active),
            ..Self::default()
        }
    }

    /// Builds a filter from list query parameters. Location and category ranges
    /// are resolved by the caller since they need a lookup.
    pub fn from_query(query: &AdvertListQuery) -> Result<Self> {
        let per_page = query.per_page();
        let offset = (query.page() - 1)
            .checked_mul(per_page)
            .ok_or_else(|| Error::BadRequest("page is out of range".to_string()))?;

        let activity = match (&query.active, query.inactive_or_archived) {
            (_, Some(true)) => Some(ActivityScope::InactiveOrArchived),
            (Some(flag), _) => Some(ActivityScope::from_flag(flag)),
            (None, _) => None,
        };

        Ok(Self {
            activity,
            premium: query.premium.as_deref().map(PremiumScope::from_flag),
            approved: query.approved,
            archived: query.archived,
            expired_yesterday: query.expired_yesterday.unwrap_or(false),
            premium_expired_yesterday: query.premium_expired_yesterday.unwrap_or(false),
            live_within_seconds: query.live_within_seconds,
            age_in_days: query.age_in_days,
            location: None,
            category: None,
            advertiser_id: query.advertiser_id,
            subuser_id: query.subuser_id,
            unowned: query.unowned.unwrap_or(false),
            order: match query.order.as_deref() {
                Some("premium") => AdvertOrder::MostPremiumFirst,
                _ => AdvertOrder::MostRecentFirst,
            },
            limit: Some(per_page),
            offset: Some(offset),
        })
    }
}

fn out_of_range(what: &str) -> Error {
    Error::BadRequest(format!("{} is out of range", what))
}

/// Closed `[start, end]` range used by the "live in the last N seconds" shape:
/// both ends are anchored to the start of the current minute.
pub fn live_within_range(now: DateTime<Utc>, seconds: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let minute = start_of_minute(now);
    let start = seconds_ago(minute, seconds).ok_or_else(|| out_of_range("live_within_seconds"))?;
    let end = seconds_ago(minute, 1).ok_or_else(|| out_of_range("live_within_seconds"))?;
    Ok((start, end))
}

/// Half-open `[start, end)` range covering the day that ended at `now`.
pub fn yesterday_range(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = days_ago(now, 1).ok_or_else(|| out_of_range("yesterday"))?;
    Ok((start, now))
}

/// Half-open range of adverts that went live `age` days ago.
pub fn age_range(now: DateTime<Utc>, age: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = days_ago(now, age).ok_or_else(|| out_of_range("age_in_days"))?;
    let end = age
        .checked_sub(1)
        .and_then(|days| days_ago(now, days))
        .ok_or_else(|| out_of_range("age_in_days"))?;
    Ok((start, end))
}

fn push_conditions<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    filter: &AdvertFilter,
    now: DateTime<Utc>,
) -> Result<()> {
    builder.push(" WHERE TRUE");

    match filter.activity {
        Some(ActivityScope::Active) => {
            builder
                .push(" AND adverts.approved = TRUE AND adverts.archived = FALSE AND adverts.active_until >= ")
                .push_bind(now);
        }
        Some(ActivityScope::Inactive) => {
            builder
                .push(" AND adverts.approved = TRUE AND adverts.active_until <= ")
                .push_bind(now);
        }
        Some(ActivityScope::InactiveOrArchived) => {
            builder
                .push(" AND adverts.approved = TRUE AND (adverts.archived = TRUE OR adverts.active_until <= ")
                .push_bind(now)
                .push(")");
        }
        None => {}
    }

    match filter.premium {
        Some(PremiumScope::Premium) => {
            builder.push(" AND adverts.premium_until >= ").push_bind(now);
        }
        Some(PremiumScope::Regular) => {
            builder
                .push(" AND (adverts.premium_until IS NULL OR adverts.premium_until <= ")
                .push_bind(now)
                .push(")");
        }
        None => {}
    }

    if let Some(approved) = filter.approved {
        builder.push(" AND adverts.approved = ").push_bind(approved);
    }
    if let Some(archived) = filter.archived {
        builder.push(" AND adverts.archived = ").push_bind(archived);
    }

    if filter.expired_yesterday {
        let (start, end) = yesterday_range(now)?;
        builder
            .push(" AND adverts.active_until >= ")
            .push_bind(start)
            .push(" AND adverts.active_until < ")
            .push_bind(end);
    }
    if filter.premium_expired_yesterday {
        let (start, end) = yesterday_range(now)?;
        builder
            .push(" AND adverts.premium_until >= ")
            .push_bind(start)
            .push(" AND adverts.premium_until < ")
            .push_bind(end);
    }
    if let Some(seconds) = filter.live_within_seconds {
        let (start, end) = live_within_range(now, seconds)?;
        builder
            .push(" AND adverts.live_at BETWEEN ")
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
    }
    if let Some(age) = filter.age_in_days {
        let (start, end) = age_range(now, age)?;
        builder
            .push(" AND adverts.live_at >= ")
            .push_bind(start)
            .push(" AND adverts.live_at < ")
            .push_bind(end);
    }

    if let Some(range) = filter.location {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM adverts_locations al JOIN locations l ON l.id = al.location_id \
                 WHERE al.advert_id = adverts.id AND l.lft BETWEEN ",
            )
            .push_bind(range.lft)
            .push(" AND ")
            .push_bind(range.rgt)
            .push(")");
    }
    if let Some(range) = filter.category {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM adverts_categories ac JOIN categories c ON c.id = ac.category_id \
                 WHERE ac.advert_id = adverts.id AND c.lft BETWEEN ",
            )
            .push_bind(range.lft)
            .push(" AND ")
            .push_bind(range.rgt)
            .push(")");
    }

    if let Some(advertiser_id) = filter.advertiser_id {
        builder
            .push(" AND adverts.advertiser_id = ")
            .push_bind(advertiser_id);
    }
    if let Some(subuser_id) = filter.subuser_id {
        builder
            .push(" AND (adverts.subuser_id = ")
            .push_bind(subuser_id)
            .push(
                " OR EXISTS (SELECT 1 FROM order_items oi JOIN orders o ON o.id = oi.order_id \
                 WHERE oi.advert_id = adverts.id AND o.subuser_id = ",
            )
            .push_bind(subuser_id)
            .push("))");
    }
    if filter.unowned {
        builder.push(" AND adverts.advertiser_id IS NULL");
    }
    Ok(())
}

pub fn build_list_query(
    filter: &AdvertFilter,
    now: DateTime<Utc>,
) -> Result<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM adverts", ADVERT_COLUMNS));
    push_conditions(&mut builder, filter, now)?;

    match filter.order {
        AdvertOrder::MostRecentFirst => {
            builder.push(" ORDER BY adverts.advert_date DESC NULLS LAST, adverts.id DESC");
        }
        AdvertOrder::MostPremiumFirst => {
            builder.push(" ORDER BY adverts.premium_until DESC NULLS LAST, adverts.advert_date DESC NULLS LAST");
        }
    }

    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = filter.offset {
        builder.push(" OFFSET ").push_bind(offset);
    }
    Ok(builder)
}

/// Distinct location states of the adverts matching `filter`.
pub fn build_states_query(
    filter: &AdvertFilter,
    now: DateTime<Utc>,
) -> Result<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(
        "SELECT DISTINCT l.state FROM locations l \
         JOIN adverts_locations al ON al.location_id = l.id \
         WHERE l.state IS NOT NULL AND al.advert_id IN (SELECT adverts.id FROM adverts",
    );
    push_conditions(&mut builder, filter, now)?;
    builder.push(")");
    Ok(builder)
}
