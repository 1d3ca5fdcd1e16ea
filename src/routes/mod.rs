mod auth;
mod health_check;
mod users;

pub use auth::{login, register, IdentityPayload, LoginRequest, LoginResponse, RegisterRequest};
pub use health_check::health_check;
pub use users::current_user;
