//! Who an advert belongs to and which orders paid for it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::advert::Advert;
use crate::models::advertiser::Advertiser;
use crate::models::order::{LinkedOrderItem, Order};
use crate::models::subuser::Subuser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSource {
    Subuser,
    Advertiser,
    Submitter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactIdentity {
    pub source: ContactSource,
    pub email: String,
}

/// Delegate, then owner, then whoever submitted the advert.
pub fn contact_identity(
    advert: &Advert,
    subuser: Option<&Subuser>,
    advertiser: Option<&Advertiser>,
) -> ContactIdentity {
    match (subuser, advertiser) {
        (Some(subuser), _) => ContactIdentity {
            source: ContactSource::Subuser,
            email: subuser.email.clone(),
        },
        (None, Some(advertiser)) => ContactIdentity {
            source: ContactSource::Advertiser,
            email: advertiser.email.clone(),
        },
        (None, None) => ContactIdentity {
            source: ContactSource::Submitter,
            email: advert.email.clone(),
        },
    }
}

/// Sorts order items earliest first, ties broken by id.
pub fn sort_order_items(items: &mut [LinkedOrderItem]) {
    items.sort_by(|a, b| {
        a.item
            .created_at
            .cmp(&b.item.created_at)
            .then(a.item.id.cmp(&b.item.id))
    });
}

/// Subuser id for an advert: an explicit assignment wins, otherwise the
/// earliest order item whose order names one.
pub fn subuser_id_for(advert: &Advert, items: &[LinkedOrderItem]) -> Option<i64> {
    if advert.subuser_id.is_some() {
        return advert.subuser_id;
    }

    let mut sorted = items.to_vec();
    sort_order_items(&mut sorted);
    sorted
        .iter()
        .filter_map(|linked| linked.order.as_ref())
        .find_map(|order| order.subuser_id)
}

/// Most recently completed order among the distinct orders behind `items`.
pub fn last_paid_order(items: &[LinkedOrderItem]) -> Option<&Order> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|linked| linked.order.as_ref())
        .filter(|order| seen.insert(order.id))
        .filter(|order| order.is_completed())
        .max_by_key(|order| order.completed_at)
}

/// Company shown for the submitter. Adverts without an owning account fall
/// back to the company named on their first order.
pub fn submitters_company_name(
    advertiser: Option<&Advertiser>,
    items: &[LinkedOrderItem],
) -> String {
    if let Some(advertiser) = advertiser {
        return advertiser
            .company_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_default()
            .to_string();
    }

    let mut sorted = items.to_vec();
    sort_order_items(&mut sorted);
    sorted
        .first()
        .and_then(|linked| linked.order.as_ref())
        .and_then(|order| order.company_name.as_deref())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_default()
        .to_string()
}
