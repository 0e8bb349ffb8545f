mod api_key;
mod middleware;
mod password;
mod token;

pub use api_key::generate_api_key;
pub use middleware::{AuthError, RequireUser};
pub use password::{hash_password, verify_password};
pub use token::{MintedToken, mint_session_token, token_lookup, verify_session_token};
