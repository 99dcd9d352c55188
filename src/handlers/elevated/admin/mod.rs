pub mod instances;

pub use instances::list as instances_list;
