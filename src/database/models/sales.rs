use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of an imported KDP sales report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub user_id: Uuid,
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub marketplace: Option<String>,
    #[serde(default)]
    pub units_sold: Option<i64>,
    #[serde(default)]
    pub royalty_earned: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
