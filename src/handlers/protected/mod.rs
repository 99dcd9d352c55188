pub mod auth;
pub mod data;
pub mod find;
pub mod sales;
