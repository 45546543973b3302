use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ADVERTISE_ACTION: &str = "advertise";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub advertiser_id: Option<i64>,
    pub subuser_id: Option<i64>,
    pub company_name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Billing line tying a purchased product action to an advert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub advert_id: i64,
    pub created_at: DateTime<Utc>,
}

/// An order item loaded together with the order it belongs to.
#[derive(Debug, Clone)]
pub struct LinkedOrderItem {
    pub item: OrderItem,
    pub order: Option<Order>,
}
