pub mod auth;
pub mod dashboard;
pub mod manuscripts;
pub mod nav;
pub mod sales;
pub mod settings;
pub mod tasks;
