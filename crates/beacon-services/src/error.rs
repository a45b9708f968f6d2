//! Error taxonomy shared by the store and the services built on it.

/// Failure reported by a [`crate::PeerStateStore`] backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or refused the operation. Transient.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Key holds a different kind of value than the operation expects.
    #[error("wrong value type at key {0}")]
    WrongType(String),
}

/// Failure surfaced to callers of the registry, selector, and relay.
///
/// Normal absence (expired peer, empty mailbox) is never an error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Missing or malformed input. The caller can fix it.
    #[error("{0}")]
    InvalidRequest(String),
    /// The referenced peer has no live record. The caller should re-announce.
    #[error("{0}")]
    NotFound(String),
    /// The store is unreachable. Safe to retry with backoff.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// True for conditions worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => Self::ServiceUnavailable(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_store_maps_to_service_unavailable() {
        let e: ServiceError = StoreError::Unavailable("down".into()).into();
        assert_eq!(e, ServiceError::ServiceUnavailable("down".into()));
        assert!(e.is_transient());
    }

    #[test]
    fn wrong_type_maps_to_internal() {
        let e: ServiceError = StoreError::WrongType("k".into()).into();
        assert!(matches!(e, ServiceError::Internal(_)));
        assert!(!e.is_transient());
    }
}
