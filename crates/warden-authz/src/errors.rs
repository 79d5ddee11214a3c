use thiserror::Error;

/// Authorization failure taxonomy.
///
/// `Unauthenticated` and `PermissionDenied` are terminal decisions for a call.
/// `Unavailable` and `Internal` mean the system could not decide. They must
/// not be downgraded to a denial, so callers can tell "you are not allowed"
/// apart from "the backend was unreachable".
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied for {0}")]
    PermissionDenied(String),
    #[error("authorization backend unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

impl From<crate::store::StoreError> for AuthzError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match err {
            StoreError::Unavailable(message) => AuthzError::Unavailable(message),
            other => AuthzError::Internal(anyhow::Error::new(other)),
        }
    }
}
