// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here receives the acting user as Extension<CurrentUser>.

pub mod athletes;
pub mod auth;
pub mod measurements;
pub mod utils;
