use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::order::OrderItem;
use crate::utils::crypto::{secrets_match, site_token, verify_password};
use crate::utils::time::LifecycleWindows;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Permanent,
    Temporary,
    Contract,
}

impl JobType {
    pub const ALL: [JobType; 3] = [JobType::Permanent, JobType::Temporary, JobType::Contract];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Permanent => "Permanent",
            JobType::Temporary => "Temporary",
            JobType::Contract => "Contract",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown job type: {0}")]
pub struct UnknownJobType(pub String);

impl TryFrom<String> for JobType {
    type Error = UnknownJobType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        JobType::ALL
            .into_iter()
            .find(|job_type| job_type.as_str() == value)
            .ok_or(UnknownJobType(value))
    }
}

/// Premium removal staged by an edit and applied by the next save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PremiumRemoval {
    #[default]
    None,
    Requested,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Advert {
    pub id: i64,
    pub reference: String,
    pub job_title: String,
    #[sqlx(try_from = "String")]
    pub job_type: JobType,
    pub description: String,
    pub telephone: String,
    pub submitters_forename: String,
    pub submitters_surname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub advert_date: Option<DateTime<Utc>>,
    pub live_at: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub premium_until: Option<DateTime<Utc>>,
    pub archived: bool,
    pub approved: bool,
    pub advertiser_id: Option<i64>,
    pub subuser_id: Option<i64>,
    pub bitly_url_cache: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip)]
    pub premium_removal: PremiumRemoval,
}

/// Column values for a new advert, after validation and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdvertRecord {
    pub reference: String,
    pub job_title: String,
    pub job_type: JobType,
    pub description: String,
    pub telephone: String,
    pub submitters_forename: String,
    pub submitters_surname: String,
    pub email: String,
    pub password_digest: String,
    pub advert_date: DateTime<Utc>,
    pub active_until: DateTime<Utc>,
    pub location_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
}

impl fmt::Display for Advert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.job_title)
    }
}

impl Advert {
    pub fn submitters_full_name(&self) -> String {
        [self.submitters_forename.as_str(), self.submitters_surname.as_str()].join(" ")
    }

    /// Edit-link token; changes whenever the password does.
    pub fn token(&self, site_name: &str) -> String {
        site_token(site_name, &self.password_digest)
    }

    pub fn verify_token(&self, site_name: &str, provided: &str) -> bool {
        secrets_match(provided, &self.token(site_name))
    }

    pub fn authenticate(&self, password: &str) -> bool {
        verify_password(password, &self.password_digest).unwrap_or(false)
    }

    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until >= now)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active_until.is_some_and(|until| until >= now)
    }

    pub fn is_active_and_not_archived(&self, now: DateTime<Utc>) -> bool {
        self.is_active(now) && !self.archived
    }

    pub fn never_advertised(&self) -> bool {
        !self.approved
    }

    // Eligibility checks for the action verbs below. None of the actions
    // enforce them; callers decide.

    pub fn is_bumpable(&self, now: DateTime<Utc>) -> bool {
        self.is_active(now) && !self.is_premium(now)
    }

    pub fn is_readvertisable(&self, now: DateTime<Utc>) -> bool {
        !self.is_active(now)
    }

    pub fn is_premiumable(&self, now: DateTime<Utc>) -> bool {
        self.is_active(now) && !self.is_premium(now)
    }

    pub fn is_archiveable(&self, now: DateTime<Utc>) -> bool {
        self.is_active(now) && !self.archived
    }

    pub fn is_unarchiveable(&self, now: DateTime<Utc>) -> bool {
        self.is_active(now) && self.archived
    }

    /// Starts a fresh run. Resets the window from `now` rather than extending it.
    pub fn advertise(
        &mut self,
        now: DateTime<Utc>,
        windows: &LifecycleWindows,
        _order_item: Option<&OrderItem>,
    ) {
        self.approved = true;
        self.active_until = Some(now + windows.expiry_window());
        self.advert_date = Some(now);
        self.live_at = Some(now);
        self.archived = false;
    }

    pub fn bump(&mut self, now: DateTime<Utc>, _order_item: Option<&OrderItem>) {
        self.advert_date = Some(now);
    }

    pub fn premium_upgrade(
        &mut self,
        now: DateTime<Utc>,
        windows: &LifecycleWindows,
        _order_item: Option<&OrderItem>,
    ) {
        self.premium_until = Some(now + windows.premium_window());
    }

    pub fn archive(&mut self) {
        self.archived = true;
    }

    pub fn unarchive(&mut self) {
        self.archived = false;
    }

    pub fn request_premium_removal(&mut self) {
        self.premium_removal = PremiumRemoval::Requested;
    }

    /// Applies staged changes ahead of a save and clears the staging.
    pub fn prepare_for_save(&mut self) {
        if std::mem::take(&mut self.premium_removal) == PremiumRemoval::Requested {
            self.premium_until = None;
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    pub fn advert() -> Advert {
        Advert {
            id: 1,
            reference: "REF-1".into(),
            job_title: "Head Chef".into(),
            job_type: JobType::Permanent,
            description: "Busy kitchen in the city centre".into(),
            telephone: "01632 960000".into(),
            submitters_forename: "Sam".into(),
            submitters_surname: "Taylor".into(),
            email: "sam@example.co.uk".into(),
            password_digest: "digest".into(),
            advert_date: None,
            live_at: None,
            active_until: None,
            premium_until: None,
            archived: false,
            approved: false,
            advertiser_id: None,
            subuser_id: None,
            bitly_url_cache: None,
            created_at: at(),
            updated_at: at(),
            premium_removal: PremiumRemoval::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{advert, at};
    use super::*;
    use chrono::Duration;

    #[test]
    fn active_requires_future_or_current_expiry() {
        let now = at();
        let mut advert = advert();
        assert!(!advert.is_active(now));

        advert.active_until = Some(now);
        assert!(advert.is_active(now));

        advert.active_until = Some(now - Duration::hours(1));
        assert!(!advert.is_active(now));
        assert!(advert.is_readvertisable(now));
    }

    #[test]
    fn premium_blocks_bump_and_premium_upgrade() {
        let now = at();
        let mut advert = advert();
        advert.premium_until = Some(now + Duration::hours(1));
        advert.active_until = Some(now + Duration::days(2));

        assert!(advert.is_premium(now));
        assert!(!advert.is_bumpable(now));
        assert!(!advert.is_premiumable(now));
        assert!(advert.is_archiveable(now));
        assert!(!advert.is_unarchiveable(now));
    }

    #[test]
    fn active_regular_advert_can_be_bumped_or_upgraded() {
        let now = at();
        let mut advert = advert();
        advert.active_until = Some(now + Duration::days(3));
        advert.premium_until = Some(now - Duration::minutes(5));

        assert!(!advert.is_premium(now));
        assert!(advert.is_bumpable(now));
        assert!(advert.is_premiumable(now));
        assert!(!advert.is_readvertisable(now));
    }

    #[test]
    fn archive_flags_combine_with_activity() {
        let now = at();
        let mut advert = advert();
        advert.archived = true;
        assert!(!advert.is_unarchiveable(now));

        advert.active_until = Some(now + Duration::days(1));
        assert!(advert.is_unarchiveable(now));
        assert!(!advert.is_archiveable(now));
        assert!(!advert.is_active_and_not_archived(now));
    }

    #[test]
    fn advertise_starts_a_full_run() {
        let now = at();
        let windows = LifecycleWindows::default();
        let mut advert = advert();
        advert.archived = true;
        advert.active_until = Some(now - Duration::days(10));
        assert!(advert.never_advertised());

        advert.advertise(now, &windows, None);

        assert!(advert.approved);
        assert!(!advert.never_advertised());
        assert!(!advert.archived);
        assert!(advert.is_active(now));
        assert_eq!(advert.active_until, Some(now + Duration::days(28)));
        assert_eq!(advert.advert_date, Some(now));
        assert_eq!(advert.live_at, Some(now));
    }

    #[test]
    fn advertise_twice_resets_instead_of_stacking() {
        let windows = LifecycleWindows::default();
        let mut advert = advert();
        advert.advertise(at(), &windows, None);

        let later = at() + Duration::days(5);
        advert.advertise(later, &windows, None);
        assert_eq!(advert.active_until, Some(later + Duration::days(28)));
    }

    #[test]
    fn bump_only_touches_advert_date() {
        let now = at();
        let mut advert = advert();
        advert.active_until = Some(now + Duration::days(3));
        advert.advert_date = Some(now - Duration::days(4));

        advert.bump(now, None);
        assert_eq!(advert.advert_date, Some(now));
        assert_eq!(advert.active_until, Some(now + Duration::days(3)));
    }

    #[test]
    fn premium_upgrade_uses_scaled_window() {
        let now = at();
        let mut advert = advert();
        advert.premium_upgrade(now, &LifecycleWindows::new(2.0), None);
        assert_eq!(advert.premium_until, Some(now + Duration::days(14)));
    }

    #[test]
    fn archive_round_trip_keeps_windows() {
        let now = at();
        let mut advert = advert();
        advert.active_until = Some(now + Duration::days(3));
        advert.premium_until = Some(now + Duration::days(1));

        advert.archive();
        assert!(advert.archived);
        advert.unarchive();
        assert!(!advert.archived);
        assert_eq!(advert.active_until, Some(now + Duration::days(3)));
        assert_eq!(advert.premium_until, Some(now + Duration::days(1)));
    }

    #[test]
    fn premium_removal_is_consumed_once() {
        let now = at();
        let mut advert = advert();
        advert.premium_until = Some(now + Duration::days(4));

        advert.prepare_for_save();
        assert!(advert.premium_until.is_some());

        advert.request_premium_removal();
        advert.prepare_for_save();
        assert_eq!(advert.premium_until, None);
        assert_eq!(advert.premium_removal, PremiumRemoval::None);

        advert.premium_upgrade(now, &LifecycleWindows::default(), None);
        advert.prepare_for_save();
        assert!(advert.premium_until.is_some());
    }

    #[test]
    fn edit_token_verifies_against_site_and_digest() {
        let advert = advert();
        let token = advert.token("Jobs");
        assert!(advert.verify_token("Jobs", &token));
        assert!(!advert.verify_token("Other", &token));
        assert!(!advert.verify_token("Jobs", "forged"));
    }

    #[test]
    fn display_and_full_name() {
        let advert = advert();
        assert_eq!(advert.to_string(), "Head Chef");
        assert_eq!(advert.submitters_full_name(), "Sam Taylor");
    }

    #[test]
    fn job_type_parses_known_values_only() {
        assert_eq!(JobType::try_from("Contract".to_string()), Ok(JobType::Contract));
        assert!(JobType::try_from("Freelance".to_string()).is_err());
    }
}
