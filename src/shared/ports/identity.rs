use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::shared::entities::UserId;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

pub type IdentityFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Validates a bearer credential and yields the stable user identifier.
/// Invoked as the first step of every authenticated endpoint.
pub trait IdentityPort: Send + Sync {
    fn verify_token(&self, token: String) -> IdentityFuture<Result<UserId, IdentityError>>;
}
