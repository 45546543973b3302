use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::advert::{Advert, JobType};
use crate::models::order::Order;
use crate::services::advert_service::AdvertContact;
use crate::services::linkage::ContactSource;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CreateAdvertPayload {
    pub reference: Option<String>,
    pub job_title: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub telephone: Option<String>,
    pub submitters_forename: Option<String>,
    pub submitters_surname: Option<String>,
    pub email: Option<String>,
    pub email_confirmation: Option<String>,
    pub password: Option<String>,
    pub password_retype: Option<String>,
    pub location_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UpdateAdvertPayload {
    /// Edit-link token; either this or `password` authorizes the edit.
    pub token: Option<String>,
    pub password: Option<String>,
    pub reference: Option<String>,
    pub job_title: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub telephone: Option<String>,
    pub submitters_forename: Option<String>,
    pub submitters_surname: Option<String>,
    /// `false` asks for premium status to be dropped on this save.
    pub make_premium: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdvertActionPayload {
    /// Edit-link token; either this or `password` authorizes the action.
    pub token: Option<String>,
    pub password: Option<String>,
    pub order_item_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct AdvertListQuery {
    #[validate(range(min = 1, max = 100_000))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<i64>,
    /// "1" lists active adverts, anything else inactive ones.
    pub active: Option<String>,
    /// "1" lists premium adverts, anything else regular ones.
    pub premium: Option<String>,
    pub archived: Option<bool>,
    pub approved: Option<bool>,
    pub inactive_or_archived: Option<bool>,
    pub expired_yesterday: Option<bool>,
    pub premium_expired_yesterday: Option<bool>,
    #[validate(range(min = 1, max = 31_536_000))]
    pub live_within_seconds: Option<i64>,
    #[validate(range(min = 1, max = 3650))]
    pub age_in_days: Option<i64>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub advertiser_id: Option<i64>,
    pub subuser_id: Option<i64>,
    pub unowned: Option<bool>,
    /// `recent` (default) or `premium`.
    pub order: Option<String>,
}

impl AdvertListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StateFilterQuery {
    pub selected: Option<String>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// Eligibility flags, evaluated at response time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvertStatus {
    pub premium: bool,
    pub active: bool,
    pub active_and_not_archived: bool,
    pub never_advertised: bool,
    pub bumpable: bool,
    pub readvertisable: bool,
    pub premiumable: bool,
    pub archiveable: bool,
    pub unarchiveable: bool,
}

impl AdvertStatus {
    pub fn evaluate(advert: &Advert, now: DateTime<Utc>) -> Self {
        Self {
            premium: advert.is_premium(now),
            active: advert.is_active(now),
            active_and_not_archived: advert.is_active_and_not_archived(now),
            never_advertised: advert.never_advertised(),
            bumpable: advert.is_bumpable(now),
            readvertisable: advert.is_readvertisable(now),
            premiumable: advert.is_premiumable(now),
            archiveable: advert.is_archiveable(now),
            unarchiveable: advert.is_unarchiveable(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertResponse {
    pub id: i64,
    pub param: String,
    pub reference: String,
    pub job_title: String,
    pub job_type: JobType,
    pub description: String,
    pub telephone: String,
    pub submitters_full_name: String,
    pub advert_date: Option<DateTime<Utc>>,
    pub live_at: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub premium_until: Option<DateTime<Utc>>,
    pub archived: bool,
    pub approved: bool,
    pub advertiser_id: Option<i64>,
    pub status: AdvertStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdvertResponse {
    pub fn new(advert: Advert, now: DateTime<Utc>) -> Self {
        let status = AdvertStatus::evaluate(&advert, now);
        Self {
            param: crate::utils::slug::advert_param(advert.id, &advert.job_title),
            submitters_full_name: advert.submitters_full_name(),
            id: advert.id,
            reference: advert.reference,
            job_title: advert.job_title,
            job_type: advert.job_type,
            description: advert.description,
            telephone: advert.telephone,
            advert_date: advert.advert_date,
            live_at: advert.live_at,
            active_until: advert.active_until,
            premium_until: advert.premium_until,
            archived: advert.archived,
            approved: advert.approved,
            advertiser_id: advert.advertiser_id,
            status,
            created_at: advert.created_at,
            updated_at: advert.updated_at,
        }
    }
}

/// Returned once, on submission. The token is the submitter's edit key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAdvertResponse {
    #[serde(flatten)]
    pub advert: AdvertResponse,
    pub edit_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertListResponse {
    pub items: Vec<AdvertResponse>,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidOrderSummary {
    pub id: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Order> for PaidOrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            completed_at: order.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertContactResponse {
    pub email: String,
    pub source: ContactSource,
    pub subuser_id: Option<i64>,
    pub company_name: String,
    pub last_posted_date: DateTime<Utc>,
    pub last_paid_order: Option<PaidOrderSummary>,
}

impl From<AdvertContact> for AdvertContactResponse {
    fn from(contact: AdvertContact) -> Self {
        Self {
            email: contact.contact.email,
            source: contact.contact.source,
            subuser_id: contact.subuser.map(|subuser| subuser.id),
            company_name: contact.company_name,
            last_posted_date: contact.last_posted_date,
            last_paid_order: contact.last_paid_order.as_ref().map(PaidOrderSummary::from),
        }
    }
}
