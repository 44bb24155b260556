use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Person already exists or phone number is in use: {name} ({phone})")]
    PersonAlreadyExists { name: String, phone: String },

    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Database not found: {0}. Run `duesbook init` first")]
    DatabaseNotInitialized(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// Rejections are expected outcomes of user input (duplicate or unknown
    /// person). Anything else is an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::PersonAlreadyExists { .. } | AppError::PersonNotFound(_)
        )
    }

    pub(crate) fn from_store(err: StoreError, name: &str, phone: &str) -> Self {
        match err {
            StoreError::Duplicate { .. } => AppError::PersonAlreadyExists {
                name: name.to_string(),
                phone: phone.to_string(),
            },
            StoreError::Database(err) => AppError::Database(err),
        }
    }
}
