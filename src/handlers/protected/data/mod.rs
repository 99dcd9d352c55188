pub mod table;

pub use table::delete as table_delete;
pub use table::patch as table_patch;
pub use table::post as table_post;
