use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, info};

use crate::database::models::tables;
use crate::gateway::{GatewayError, TenantGateway};

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y", "%b %d, %Y", "%B %d, %Y"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report has {rows} rows, the limit is {limit}")]
    TooManyRows { rows: usize, limit: usize },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A sales line that carried a usable date. Ownership columns are stamped
/// later by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSale {
    pub sale_date: NaiveDate,
    pub book_title: Option<String>,
    pub marketplace: Option<String>,
    pub units_sold: Option<i64>,
    pub royalty_earned: Option<Decimal>,
}

impl ParsedSale {
    pub(crate) fn to_row(&self) -> Value {
        json!({
            "sale_date": self.sale_date.format("%Y-%m-%d").to_string(),
            "book_title": self.book_title,
            "marketplace": self.marketplace,
            "units_sold": self.units_sold,
            "royalty_earned": self.royalty_earned,
        })
    }
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub rows: Vec<ParsedSale>,
    /// Non-empty records read from the file
    pub parsed: usize,
    /// Records dropped because their date was missing or unreadable
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub parsed: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub inserted: usize,
}

/// Reads KDP sales exports: `Date, Title, Marketplace, Units Sold/KENP Read,
/// Royalty`. Header matching is case-insensitive and ignores surrounding
/// whitespace; unknown columns are ignored.
pub struct IngestService;

struct Columns {
    date: Option<usize>,
    title: Option<usize>,
    marketplace: Option<usize>,
    units: Option<usize>,
    royalty: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        fn find(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        }
        Self {
            date: find(headers, &["Date", "Sale Date"]),
            title: find(headers, &["Title", "Book Title"]),
            marketplace: find(headers, &["Marketplace"]),
            units: find(headers, &["Units Sold/KENP Read", "Units Sold", "Units"]),
            royalty: find(headers, &["Royalty", "Royalty Earned"]),
        }
    }
}

impl IngestService {
    pub fn parse(bytes: &[u8]) -> Result<IngestReport, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);
        let columns = Columns::from_headers(reader.headers()?);

        let mut report = IngestReport::default();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            report.parsed += 1;

            let field = |index: Option<usize>| index.and_then(|i| record.get(i)).filter(|v| !v.is_empty());
            let Some(sale_date) = field(columns.date).and_then(parse_date) else {
                report.skipped += 1;
                continue;
            };
            report.rows.push(ParsedSale {
                sale_date,
                book_title: field(columns.title).map(str::to_string),
                marketplace: field(columns.marketplace).map(str::to_string),
                units_sold: field(columns.units).and_then(parse_units),
                royalty_earned: field(columns.royalty).and_then(parse_amount),
            });
        }

        debug!("Parsed sales report: {} records, {} skipped", report.parsed, report.skipped);
        Ok(report)
    }

    /// Parses the report and inserts every dated row under the caller's scope.
    pub async fn ingest(gateway: &TenantGateway, bytes: &[u8], max_rows: usize) -> Result<IngestSummary, IngestError> {
        let report = Self::parse(bytes)?;
        if report.parsed > max_rows {
            return Err(IngestError::TooManyRows { rows: report.parsed, limit: max_rows });
        }

        let accepted = report.rows.len();
        let inserted = if accepted == 0 {
            0
        } else {
            let rows = report.rows.iter().map(ParsedSale::to_row).collect();
            gateway.insert(tables::SALES_DATA, rows).await?.len()
        };

        info!(
            "Imported {} sales rows for instance {} ({} skipped)",
            inserted,
            gateway.scope().instance_id,
            report.skipped
        );
        Ok(IngestSummary {
            parsed: report.parsed,
            accepted,
            skipped: report.skipped,
            inserted,
        })
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|dt| dt.date()))
        .or_else(|| raw.get(..10).and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()))
}

fn parse_units(raw: &str) -> Option<i64> {
    let cleaned = raw.replace(',', "");
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    Decimal::from_str(&cleaned).ok()
}
