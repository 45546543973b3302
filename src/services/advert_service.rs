use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::dto::advert_dto::{
    AdvertActionPayload, AdvertListQuery, CreateAdvertPayload, StateFilterQuery,
    UpdateAdvertPayload,
};
use crate::error::{Error, Result};
use crate::models::advert::{Advert, JobType, NewAdvertRecord};
use crate::models::order::{Order, OrderItem, ADVERTISE_ACTION};
use crate::models::subuser::Subuser;
use crate::services::advert_query::AdvertFilter;
use crate::services::advert_repository::AdvertRepository;
use crate::services::advert_validator::{validate_record, validate_submission, AdvertFields};
use crate::services::linkage::{
    contact_identity, last_paid_order, submitters_company_name, subuser_id_for, ContactIdentity,
};
use crate::services::short_link_service::UrlShortener;
use crate::services::state_filter::{state_rows, StateOption};
use crate::utils::crypto::hash_password;
use crate::utils::slug::advert_url;
use crate::utils::time::{now, LifecycleWindows};
use crate::utils::validation::reject_if_any;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertAction {
    Advertise,
    Bump,
    PremiumUpgrade,
    Archive,
    Unarchive,
}

impl AdvertAction {
    pub fn name(&self) -> &'static str {
        match self {
            AdvertAction::Advertise => "advertise",
            AdvertAction::Bump => "bump",
            AdvertAction::PremiumUpgrade => "premium_upgrade",
            AdvertAction::Archive => "archive",
            AdvertAction::Unarchive => "unarchive",
        }
    }

    /// Advertising is always allowed; a live run is simply restarted.
    pub fn is_eligible(&self, advert: &Advert, now: DateTime<Utc>) -> bool {
        match self {
            AdvertAction::Advertise => true,
            AdvertAction::Bump => advert.is_bumpable(now),
            AdvertAction::PremiumUpgrade => advert.is_premiumable(now),
            AdvertAction::Archive => advert.is_archiveable(now),
            AdvertAction::Unarchive => advert.is_unarchiveable(now),
        }
    }

    pub fn apply(
        &self,
        advert: &mut Advert,
        now: DateTime<Utc>,
        windows: &LifecycleWindows,
        order_item: Option<&OrderItem>,
    ) {
        match self {
            AdvertAction::Advertise => advert.advertise(now, windows, order_item),
            AdvertAction::Bump => advert.bump(now, order_item),
            AdvertAction::PremiumUpgrade => advert.premium_upgrade(now, windows, order_item),
            AdvertAction::Archive => advert.archive(),
            AdvertAction::Unarchive => advert.unarchive(),
        }
    }
}

/// Everything known about who to contact for an advert and what paid for it.
#[derive(Debug, Clone)]
pub struct AdvertContact {
    pub contact: ContactIdentity,
    pub subuser: Option<Subuser>,
    pub company_name: String,
    pub last_posted_date: DateTime<Utc>,
    pub last_paid_order: Option<Order>,
}

#[derive(Clone)]
pub struct AdvertService {
    repo: Arc<dyn AdvertRepository>,
    shortener: Option<Arc<dyn UrlShortener>>,
    windows: LifecycleWindows,
    url_host: String,
    site_name: String,
}

impl AdvertService {
    pub fn new(
        repo: Arc<dyn AdvertRepository>,
        shortener: Option<Arc<dyn UrlShortener>>,
        windows: LifecycleWindows,
        url_host: String,
        site_name: String,
    ) -> Self {
        Self {
            repo,
            shortener,
            windows,
            url_host,
            site_name,
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn submit(&self, payload: CreateAdvertPayload) -> Result<Advert> {
        reject_if_any(validate_submission(&payload))?;

        let password_digest = hash_password(payload.password.as_deref().unwrap_or_default())?;
        let record = build_record(payload, password_digest, now(), &self.windows)?;
        let advert = self.repo.insert(record).await?;

        info!(advert_id = advert.id, "Advert submitted");
        Ok(advert)
    }

    pub async fn get(&self, id: i64) -> Result<Advert> {
        self.repo.find(id).await
    }

    pub async fn list(&self, query: &AdvertListQuery) -> Result<Vec<Advert>> {
        let mut filter = AdvertFilter::from_query(query)?;
        self.resolve_ranges(&mut filter, query.location_id, query.category_id)
            .await?;
        self.repo.list(&filter, now()).await
    }

    /// State filter rows for the adverts currently on show.
    pub async fn state_rows(&self, query: &StateFilterQuery) -> Result<Vec<Vec<StateOption>>> {
        let mut filter = AdvertFilter::active();
        self.resolve_ranges(&mut filter, query.location_id, query.category_id)
            .await?;
        let states = self.repo.location_states(&filter, now()).await?;
        Ok(state_rows(states, query.selected.as_deref()))
    }

    async fn resolve_ranges(
        &self,
        filter: &mut AdvertFilter,
        location_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<()> {
        if let Some(id) = location_id {
            filter.location = Some(self.repo.find_location(id).await?.range());
        }
        if let Some(id) = category_id {
            filter.category = Some(self.repo.find_category(id).await?.range());
        }
        Ok(())
    }

    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: i64, payload: UpdateAdvertPayload) -> Result<Advert> {
        let mut advert = self.repo.find(id).await?;
        self.authorize_edit(&advert, payload.token.as_deref(), payload.password.as_deref())?;

        if let Some(reference) = payload.reference {
            advert.reference = reference;
        }
        if let Some(job_title) = payload.job_title {
            advert.job_title = job_title;
        }
        if let Some(description) = payload.description {
            advert.description = description;
        }
        if let Some(telephone) = payload.telephone {
            advert.telephone = telephone;
        }
        if let Some(forename) = payload.submitters_forename {
            advert.submitters_forename = forename;
        }
        if let Some(surname) = payload.submitters_surname {
            advert.submitters_surname = surname;
        }
        if payload.make_premium == Some(false) {
            advert.request_premium_removal();
        }

        // An unknown job type is reported alongside every other field error.
        let mut fields = AdvertFields::from(&advert);
        if let Some(job_type) = payload.job_type.as_deref() {
            fields.job_type = Some(job_type);
        }
        reject_if_any(validate_record(&fields))?;

        if let Some(job_type) = payload.job_type {
            advert.job_type =
                JobType::try_from(job_type).map_err(|err| Error::BadRequest(err.to_string()))?;
        }
        self.save(advert).await
    }

    fn authorize_edit(
        &self,
        advert: &Advert,
        token: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let token_ok = token.is_some_and(|token| advert.verify_token(&self.site_name, token));
        let password_ok = password.is_some_and(|password| advert.authenticate(password));

        if token_ok || password_ok {
            Ok(())
        } else {
            Err(Error::Unauthorized(
                "A valid edit token or password is required".to_string(),
            ))
        }
    }

    pub fn edit_token(&self, advert: &Advert) -> String {
        advert.token(&self.site_name)
    }

    /// Persists `advert`, applying any staged changes first.
    pub async fn save(&self, mut advert: Advert) -> Result<Advert> {
        advert.prepare_for_save();
        self.repo.update(&advert).await
    }

    /// Runs a lifecycle action for a caller holding the edit token or password.
    /// Returns `Conflict` when the advert is not eligible for it right now.
    #[instrument(skip(self, action, payload), fields(action = action.name()))]
    pub async fn perform(
        &self,
        id: i64,
        action: AdvertAction,
        payload: &AdvertActionPayload,
    ) -> Result<Advert> {
        let mut advert = self.repo.find(id).await?;
        self.authorize_edit(&advert, payload.token.as_deref(), payload.password.as_deref())?;

        let order_item_id = payload.order_item_id;
        let at = now();
        if !action.is_eligible(&advert, at) {
            return Err(Error::Conflict(format!(
                "Advert {} cannot {} right now",
                id,
                action.name()
            )));
        }

        let order_item = self.order_item(&advert, order_item_id).await?;
        action.apply(&mut advert, at, &self.windows, order_item.as_ref());

        let saved = self.save(advert).await?;
        info!(advert_id = id, ?order_item_id, "Advert action applied");
        Ok(saved)
    }

    async fn order_item(
        &self,
        advert: &Advert,
        order_item_id: Option<i64>,
    ) -> Result<Option<OrderItem>> {
        let Some(order_item_id) = order_item_id else {
            return Ok(None);
        };
        self.repo
            .linked_order_items(advert.id)
            .await?
            .into_iter()
            .map(|linked| linked.item)
            .find(|item| item.id == order_item_id)
            .map(Some)
            .ok_or_else(|| Error::NotFound(format!("Order item {} not found", order_item_id)))
    }

    pub async fn contact(&self, id: i64) -> Result<AdvertContact> {
        let advert = self.repo.find(id).await?;
        let items = self.repo.linked_order_items(id).await?;

        let subuser = match subuser_id_for(&advert, &items) {
            Some(subuser_id) => self.repo.find_subuser(subuser_id).await?,
            None => None,
        };
        let advertiser = match advert.advertiser_id {
            Some(advertiser_id) => self.repo.find_advertiser(advertiser_id).await?,
            None => None,
        };

        Ok(AdvertContact {
            contact: contact_identity(&advert, subuser.as_ref(), advertiser.as_ref()),
            company_name: submitters_company_name(advertiser.as_ref(), &items),
            last_posted_date: self.last_posted_date(&advert).await,
            last_paid_order: last_paid_order(&items).cloned(),
            subuser,
        })
    }

    /// When the advert was last paid to go live. Display only, so lookup
    /// failures fall back to the creation time.
    pub async fn last_posted_date(&self, advert: &Advert) -> DateTime<Utc> {
        match self
            .repo
            .last_completed_at_for_action(advert.id, ADVERTISE_ACTION)
            .await
        {
            Ok(Some(completed_at)) => completed_at,
            Ok(None) => advert.created_at,
            Err(err) => {
                warn!(advert_id = advert.id, error = ?err, "Last posted date lookup failed");
                advert.created_at
            }
        }
    }

    pub fn canonical_url(&self, advert: &Advert) -> Result<String> {
        Ok(advert_url(&self.url_host, advert.id, &advert.job_title)?)
    }

    /// Short link for an advert, cached on first success. Any failure along
    /// the way yields the canonical URL instead.
    #[instrument(skip(self))]
    pub async fn short_url(&self, id: i64) -> Result<String> {
        let advert = self.repo.find(id).await?;
        if let Some(cached) = advert
            .bitly_url_cache
            .as_deref()
            .filter(|url| !url.trim().is_empty())
        {
            return Ok(cached.to_string());
        }

        let canonical = self.canonical_url(&advert)?;
        let Some(shortener) = &self.shortener else {
            return Ok(canonical);
        };

        match shortener.shorten(&canonical).await {
            Ok(short) if !short.trim().is_empty() => {
                match self.repo.cache_short_url(id, &short).await {
                    Ok(()) => Ok(short),
                    Err(err) => {
                        warn!(advert_id = id, error = ?err, "Could not cache short link");
                        Ok(canonical)
                    }
                }
            }
            Ok(_) => Ok(canonical),
            Err(err) => {
                warn!(advert_id = id, error = ?err, "URL shortener failed");
                Ok(canonical)
            }
        }
    }
}

/// Column values for a validated submission. Every new advert starts a fresh
/// run at `now` and belongs to no account.
pub fn build_record(
    payload: CreateAdvertPayload,
    password_digest: String,
    now: DateTime<Utc>,
    windows: &LifecycleWindows,
) -> Result<NewAdvertRecord> {
    let job_type = JobType::try_from(payload.job_type.unwrap_or_default())
        .map_err(|err| Error::BadRequest(err.to_string()))?;

    Ok(NewAdvertRecord {
        reference: payload.reference.unwrap_or_default(),
        job_title: payload.job_title.unwrap_or_default(),
        job_type,
        description: payload.description.unwrap_or_default(),
        telephone: payload.telephone.unwrap_or_default(),
        submitters_forename: payload.submitters_forename.unwrap_or_default(),
        submitters_surname: payload.submitters_surname.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        password_digest,
        advert_date: now,
        active_until: now + windows.expiry_window(),
        location_ids: payload.location_ids,
        category_ids: payload.category_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::advert::fixtures::{advert, at};
    use crate::models::order::LinkedOrderItem;
    use crate::services::advert_repository::MockAdvertRepository;
    use crate::services::short_link_service::MockUrlShortener;
    use chrono::Duration;

    fn service(repo: MockAdvertRepository, shortener: Option<MockUrlShortener>) -> AdvertService {
        AdvertService::new(
            Arc::new(repo),
            shortener.map(|s| Arc::new(s) as Arc<dyn UrlShortener>),
            LifecycleWindows::default(),
            "https://jobs.example.co.uk".to_string(),
            "Jobs".to_string(),
        )
    }

    fn live_advert() -> Advert {
        let mut advert = advert();
        advert.id = 7;
        advert.approved = true;
        advert.active_until = Some(now() + Duration::days(10));
        advert.advert_date = Some(now() - Duration::days(18));
        advert
    }

    fn authorized(order_item_id: Option<i64>) -> AdvertActionPayload {
        AdvertActionPayload {
            token: Some(live_advert().token("Jobs")),
            order_item_id,
            ..AdvertActionPayload::default()
        }
    }

    fn echo_update(repo: &mut MockAdvertRepository) {
        repo.expect_update().returning(|advert| Ok(advert.clone()));
    }

    #[test]
    fn new_record_defaults_to_a_full_run() {
        let payload = CreateAdvertPayload {
            reference: Some("CHEF-01".into()),
            job_title: Some("Head Chef".into()),
            job_type: Some("Temporary".into()),
            ..CreateAdvertPayload::default()
        };
        let record = build_record(payload, "digest".into(), at(), &LifecycleWindows::new(0.5)).unwrap();
        assert_eq!(record.advert_date, at());
        assert_eq!(record.active_until, at() + Duration::days(14));
        assert_eq!(record.job_type, JobType::Temporary);
    }

    #[tokio::test]
    async fn invalid_submission_never_reaches_storage() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_insert().never();

        let result = service(repo, None).submit(CreateAdvertPayload::default()).await;
        assert!(matches!(result, Err(Error::Rejected(errors)) if !errors.is_empty()));
    }

    #[tokio::test]
    async fn advertise_persists_a_fresh_run() {
        let mut repo = MockAdvertRepository::new();
        let mut expired = live_advert();
        expired.active_until = Some(now() - Duration::days(1));
        expired.archived = true;
        repo.expect_find().returning(move |_| Ok(expired.clone()));
        echo_update(&mut repo);

        let saved = service(repo, None)
            .perform(7, AdvertAction::Advertise, &authorized(None))
            .await
            .unwrap();
        assert!(saved.is_active(now()));
        assert!(saved.approved);
        assert!(!saved.archived);
        assert_eq!(saved.live_at, saved.advert_date);
    }

    #[tokio::test]
    async fn bump_of_premium_advert_conflicts() {
        let mut repo = MockAdvertRepository::new();
        let mut premium = live_advert();
        premium.premium_until = Some(now() + Duration::days(2));
        repo.expect_find().returning(move |_| Ok(premium.clone()));
        repo.expect_update().never();

        let result = service(repo, None).perform(7, AdvertAction::Bump, &authorized(None)).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn action_with_unknown_order_item_is_not_found() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| Ok(live_advert()));
        repo.expect_linked_order_items().returning(|_| Ok(Vec::new()));
        repo.expect_update().never();

        let result = service(repo, None)
            .perform(7, AdvertAction::PremiumUpgrade, &authorized(Some(99)))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn action_records_known_order_item() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| Ok(live_advert()));
        repo.expect_linked_order_items().returning(|_| {
            Ok(vec![LinkedOrderItem {
                item: OrderItem {
                    id: 99,
                    order_id: 1,
                    product_id: 1,
                    advert_id: 7,
                    created_at: at(),
                },
                order: None,
            }])
        });
        echo_update(&mut repo);

        let saved = service(repo, None)
            .perform(7, AdvertAction::PremiumUpgrade, &authorized(Some(99)))
            .await
            .unwrap();
        assert!(saved.is_premium(now()));
    }

    #[tokio::test]
    async fn premium_removal_is_applied_on_save() {
        let mut repo = MockAdvertRepository::new();
        let mut premium = live_advert();
        premium.premium_until = Some(now() + Duration::days(2));
        let token = premium.token("Jobs");
        repo.expect_find().returning(move |_| Ok(premium.clone()));
        repo.expect_update()
            .withf(|advert| advert.premium_until.is_none())
            .returning(|advert| Ok(advert.clone()));

        let saved = service(repo, None)
            .update(
                7,
                UpdateAdvertPayload {
                    token: Some(token),
                    make_premium: Some(false),
                    ..UpdateAdvertPayload::default()
                },
            )
            .await
            .unwrap();
        assert!(!saved.is_premium(now()));
    }

    #[tokio::test]
    async fn update_without_credentials_is_unauthorized() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| Ok(live_advert()));
        repo.expect_update().never();

        let result = service(repo, None)
            .update(
                7,
                UpdateAdvertPayload {
                    token: Some("forged".into()),
                    job_title: Some("Sous Chef".into()),
                    ..UpdateAdvertPayload::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn action_without_credentials_is_unauthorized() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| Ok(live_advert()));
        repo.expect_update().never();

        let anonymous = AdvertActionPayload::default();
        let result = service(repo, None)
            .perform(7, AdvertAction::PremiumUpgrade, &anonymous)
            .await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn unknown_job_type_is_rejected_with_other_field_errors() {
        let mut repo = MockAdvertRepository::new();
        let advert = live_advert();
        let token = advert.token("Jobs");
        repo.expect_find().returning(move |_| Ok(advert.clone()));
        repo.expect_update().never();

        let result = service(repo, None)
            .update(
                7,
                UpdateAdvertPayload {
                    token: Some(token),
                    job_type: Some("Freelance".into()),
                    telephone: Some(" ".into()),
                    ..UpdateAdvertPayload::default()
                },
            )
            .await;
        match result {
            Err(Error::Rejected(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["job_type", "telephone"]);
                assert_eq!(errors[0].message, "Please choose a job type for this advert");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_applies_known_job_type() {
        let mut repo = MockAdvertRepository::new();
        let advert = live_advert();
        let token = advert.token("Jobs");
        repo.expect_find().returning(move |_| Ok(advert.clone()));
        echo_update(&mut repo);

        let saved = service(repo, None)
            .update(
                7,
                UpdateAdvertPayload {
                    token: Some(token),
                    job_type: Some("Contract".into()),
                    ..UpdateAdvertPayload::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.job_type, JobType::Contract);
    }

    #[tokio::test]
    async fn last_posted_date_falls_back_on_error() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_last_completed_at_for_action()
            .returning(|_, _| Err(Error::Internal("connection reset".into())));
        let advert = live_advert();

        let posted = service(repo, None).last_posted_date(&advert).await;
        assert_eq!(posted, advert.created_at);
    }

    #[tokio::test]
    async fn last_posted_date_uses_latest_advertise_order() {
        let completed = at() + Duration::days(2);
        let mut repo = MockAdvertRepository::new();
        repo.expect_last_completed_at_for_action()
            .withf(|_, action| action == ADVERTISE_ACTION)
            .returning(move |_, _| Ok(Some(completed)));

        let posted = service(repo, None).last_posted_date(&live_advert()).await;
        assert_eq!(posted, completed);
    }

    #[tokio::test]
    async fn short_url_falls_back_when_shortener_fails() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| Ok(live_advert()));
        repo.expect_cache_short_url().never();
        let mut shortener = MockUrlShortener::new();
        shortener
            .expect_shorten()
            .returning(|_| Err(Error::Internal("bitly down".into())));

        let url = service(repo, Some(shortener)).short_url(7).await.unwrap();
        assert_eq!(url, "https://jobs.example.co.uk/adverts/7-head-chef");
    }

    #[tokio::test]
    async fn short_url_is_cached_after_success() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| Ok(live_advert()));
        repo.expect_cache_short_url()
            .withf(|id, url| *id == 7 && url == "https://bit.ly/abc")
            .times(1)
            .returning(|_, _| Ok(()));
        let mut shortener = MockUrlShortener::new();
        shortener
            .expect_shorten()
            .withf(|long_url| long_url == "https://jobs.example.co.uk/adverts/7-head-chef")
            .returning(|_| Ok("https://bit.ly/abc".to_string()));

        let url = service(repo, Some(shortener)).short_url(7).await.unwrap();
        assert_eq!(url, "https://bit.ly/abc");
    }

    #[tokio::test]
    async fn cached_short_url_skips_the_shortener() {
        let mut repo = MockAdvertRepository::new();
        repo.expect_find().returning(|_| {
            let mut advert = live_advert();
            advert.bitly_url_cache = Some("https://bit.ly/cached".into());
            Ok(advert)
        });
        let mut shortener = MockUrlShortener::new();
        shortener.expect_shorten().never();

        let url = service(repo, Some(shortener)).short_url(7).await.unwrap();
        assert_eq!(url, "https://bit.ly/cached");
    }
}
