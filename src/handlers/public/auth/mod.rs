pub mod activate;
pub mod signin;
pub mod signup;

pub use activate::activate as user_activate;
pub use signin::signin as session_signin;
pub use signup::signup as user_signup;
