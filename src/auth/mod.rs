//! Device-authorization login against the SSO OIDC service.

pub mod device_code;
pub mod error;
pub mod login;
pub mod token;

pub use device_code::{DeviceAuthorization, LoginState};
pub use error::AuthError;
pub use login::{DeviceLogin, LoginEvent};
pub use token::AccessToken;
