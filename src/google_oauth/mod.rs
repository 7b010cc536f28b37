pub mod credentials;
pub mod endpoints;

pub use credentials::AuthorizedUser;
pub use endpoints::{GoogleOauthEndpoints, GoogleTokenResponse};
