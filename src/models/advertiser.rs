use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Advertiser {
    pub id: i64,
    pub email: String,
    pub forename: String,
    pub surname: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
