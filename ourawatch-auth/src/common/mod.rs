mod models;

pub use models::{Credential, TokenGrant, EXPIRY_MARGIN};
