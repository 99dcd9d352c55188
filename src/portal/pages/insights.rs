use rust_decimal::Decimal;
use serde::Serialize;

use super::{decode_all, PageContext};
use crate::database::models::{tables, SalesRow};
use crate::portal::error::ClientError;
use crate::services::IngestSummary;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesTotals {
    pub rows: usize,
    pub units_sold: i64,
    pub royalty_earned: Decimal,
}

impl SalesTotals {
    pub fn from_rows(rows: &[SalesRow]) -> Self {
        Self {
            rows: rows.len(),
            units_sold: rows.iter().filter_map(|r| r.units_sold).fold(0, i64::saturating_add),
            royalty_earned: rows
                .iter()
                .filter_map(|r| r.royalty_earned)
                .fold(Decimal::ZERO, Decimal::saturating_add),
        }
    }
}

/// Sales rows of the instance, most recent sale first.
pub async fn list_sales(ctx: &PageContext) -> Result<Vec<SalesRow>, ClientError> {
    let filter = ctx.scoped().order_by("sale_date", false);
    let rows = ctx.backend().select_many(tables::SALES_DATA, &filter).await?;
    decode_all(rows)
}

/// Uploads a KDP report. Parsing and stamping happen on the server.
pub async fn import_report(ctx: &PageContext, csv: Vec<u8>) -> Result<IngestSummary, ClientError> {
    if csv.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::validation("The sales report is empty"));
    }
    ctx.backend().import_sales(csv).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::portal::session::SessionStore;
    use crate::testing::FakeBackend;
    use std::sync::Arc;
    use uuid::Uuid;

    const REPORT: &str = "Date,Title,Marketplace,Units Sold/KENP Read,Royalty\n\
        2025-01-05,Tidewater,Amazon.com,3,6.30\n\
        2025-01-07,Tidewater,Amazon.co.uk,1,2.10\n\
        ,Missing date,Amazon.com,1,1.00\n";

    #[tokio::test]
    async fn imports_and_lists_most_recent_first() {
        let backend = Arc::new(FakeBackend::new());
        let user = backend.add_account("a@x.com", "secret1");
        let profile = backend.add_profile(user, Uuid::new_v4(), Role::Author, "Ada");
        SessionStore::new(backend.clone()).sign_in("a@x.com", "secret1").await.unwrap();
        let ctx = PageContext::new(backend.clone(), profile.clone());

        let summary = import_report(&ctx, REPORT.as_bytes().to_vec()).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 1);

        let sales = list_sales(&ctx).await.unwrap();
        assert_eq!(sales[0].sale_date.to_string(), "2025-01-07");
        assert!(sales.iter().all(|s| s.instance_id == profile.instance_id && s.user_id == profile.id));

        let totals = SalesTotals::from_rows(&sales);
        assert_eq!(totals.units_sold, 4);
        assert_eq!(totals.royalty_earned, Decimal::new(840, 2));
    }

    fn sale(units: i64, royalty: Decimal) -> SalesRow {
        SalesRow {
            id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            sale_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            book_title: Some("Tidewater".into()),
            marketplace: None,
            units_sold: Some(units),
            royalty_earned: Some(royalty),
            created_at: None,
        }
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let rows = vec![sale(i64::MAX, Decimal::MAX), sale(1, Decimal::ONE), sale(5, Decimal::ONE)];
        let totals = SalesTotals::from_rows(&rows);
        assert_eq!(totals.rows, 3);
        assert_eq!(totals.units_sold, i64::MAX);
        assert_eq!(totals.royalty_earned, Decimal::MAX);
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_locally() {
        let backend = Arc::new(FakeBackend::new());
        let user = backend.add_account("a@x.com", "secret1");
        let profile = backend.add_profile(user, Uuid::new_v4(), Role::Author, "Ada");
        let ctx = PageContext::new(backend.clone(), profile);
        assert!(matches!(import_report(&ctx, b"  \n".to_vec()).await, Err(ClientError::Validation(_))));
    }
}
