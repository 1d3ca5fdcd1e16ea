/// Middleware module
///
/// The token gate protecting identity-bound routes, plus request logging.

mod request_logger;
mod token_gate;

pub use request_logger::RequestLogger;
pub use token_gate::TokenGate;
pub use token_gate::ACCESS_TOKEN_COOKIE;
