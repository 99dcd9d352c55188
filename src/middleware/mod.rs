pub mod auth;
pub mod response;
pub mod validate_profile;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use validate_profile::{require_super_admin_middleware, validate_profile_middleware, ValidatedProfile};
