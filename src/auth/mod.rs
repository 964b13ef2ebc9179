mod credential;
mod login;

pub use credential::{Credential, Secret, SessionToken, SESSION_COOKIE};
pub use login::SessionAuthenticator;
