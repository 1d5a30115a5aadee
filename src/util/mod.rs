//! URL validation helpers shared by the resolver and the CLI.
//!
//! - **Scheme policy**: only `http` and `https` URLs are fetched
//! - **Host policy**: optional rejection of localhost and private IP literals

mod url_validator;

pub use url_validator::{check_public_host, validate_url, UrlValidationError};
