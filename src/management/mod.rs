mod credentials;
mod lifecycle;

pub use credentials::CredentialStore;
pub use lifecycle::{TokenLifecycle, TokenState};
