use thiserror::Error;

use gomarketplace_core::DomainError;
use gomarketplace_infra::StorageError;

pub type CartResult<T> = Result<T, CartError>;

/// Errors surfaced by the cart store and its provider.
///
/// Storage and serialization failures are propagated as-is; the store never
/// retries and never rolls back an already-published state.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart was requested before its provider finished initializing.
    #[error("cart must be used within an initialized CartProvider")]
    NotInitialized,

    #[error("cart provider is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("cart serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_message_names_the_provider() {
        assert_eq!(
            CartError::NotInitialized.to_string(),
            "cart must be used within an initialized CartProvider"
        );
    }

    #[test]
    fn domain_errors_display_transparently() {
        let err: CartError = DomainError::not_found("product 'x'").into();
        assert_eq!(err.to_string(), "not found: product 'x'");
    }
}
