use service::{errors::ServiceError, ItemStore};

use crate::errors::{ApiError, ErrorDetail};

/// Shared by every handler; the store's backend handle is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: ItemStore,
    pub errors: ErrorDetail,
}

impl AppState {
    pub fn new(store: ItemStore, errors: ErrorDetail) -> Self {
        Self { store, errors }
    }

    /// Convert a store failure into the response envelope under this state's policy.
    pub fn error(&self, err: ServiceError) -> ApiError {
        ApiError::from_service(err, self.errors)
    }
}
