pub mod claims;
pub mod identity;
pub mod issuer;
pub mod signing;
pub mod validator;

pub use identity::{Identity, PermissionSet};
pub use issuer::{TokenError, TokenIssuer};
pub use signing::SigningKeys;
pub use validator::TokenValidator;
