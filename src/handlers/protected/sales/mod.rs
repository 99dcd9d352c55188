pub mod import;

pub use import::import as sales_import;
