pub mod account_service;
pub mod admin_service;
pub mod ingest_service;

pub use account_service::{validate_email_format, AccountError, AccountService, SessionGrant, SignUpAttributes, SignUpOutcome};
pub use admin_service::{AdminService, InstanceSummary};
pub use ingest_service::{IngestError, IngestReport, IngestService, IngestSummary};
