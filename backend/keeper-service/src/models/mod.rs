/// Data models for users and their stored credentials
pub mod credential;
pub mod user;

pub use credential::{Credential, CredentialPayload, EditCredentialPayload};
pub use user::{AuthRequest, Session, User};
