pub mod account;
pub mod manuscript;
pub mod profile;
pub mod sales;
pub mod task;

pub use account::Account;
pub use manuscript::{KdpFormat, Manuscript};
pub use profile::{Role, ThemePreference, UserProfile};
pub use sales::SalesRow;
pub use task::{Task, TaskStatus};

/// Backend table names.
pub mod tables {
    pub const ACCOUNTS: &str = "accounts";
    pub const USERS: &str = "users";
    pub const TASKS: &str = "tasks";
    pub const MANUSCRIPTS: &str = "manuscripts";
    pub const SALES_DATA: &str = "sales_data";

    /// Tables partitioned by `instance_id` and owned by a `user_id`.
    pub const TENANT_TABLES: [&str; 3] = [TASKS, MANUSCRIPTS, SALES_DATA];

    pub fn is_tenant_table(table: &str) -> bool {
        TENANT_TABLES.contains(&table)
    }
}
