use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A delegated account acting for an advertiser.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subuser {
    pub id: i64,
    pub advertiser_id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
