pub mod session;

pub use session::logout as session_logout;
pub use session::refresh as session_refresh;
pub use session::whoami as session_whoami;
