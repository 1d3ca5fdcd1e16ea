/// Authentication primitives: bcrypt password hashing and signed
/// session-token issuance.

mod password;
mod token;

pub use password::hash_password;
pub use password::verify_password;
pub use password::PasswordError;
pub use password::DEFAULT_HASH_COST;
pub use token::Claims;
pub use token::IssuedToken;
pub use token::TokenError;
pub use token::TokenIssuer;
