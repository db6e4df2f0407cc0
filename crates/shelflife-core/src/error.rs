//! Error types for the shelflife-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the shelflife library.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Text recognition error.
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    /// Inventory store error.
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Notification error.
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning a label image into text.
///
/// A label that was read fine but carries no date is not an error; see
/// [`crate::ExtractionResult::expiry_date`].
#[derive(Error, Debug)]
pub enum RecognizerError {
    /// The image could not be opened or decoded.
    #[error("could not read image: {0}")]
    ImageDecode(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// The recognition engine failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The recognition engine did not finish in time.
    #[error("text recognition timed out after {0:?}")]
    Timeout(Duration),
}

impl From<image::ImageError> for RecognizerError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

/// Errors related to inventory storage.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// No item with the given id.
    #[error("item {0} not found")]
    NotFound(u64),

    /// The item failed validation.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Backing file could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not valid store JSON.
    #[error("store data is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors related to sending alerts.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Sender or recipient addresses are missing.
    #[error("notifier is not configured: {0}")]
    NotConfigured(String),

    /// A header value contains a line break.
    #[error("invalid {0} header: line breaks are not allowed")]
    InvalidHeader(&'static str),

    /// The message could not be handed to the transport.
    #[error("failed to deliver message: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the shelflife library.
pub type Result<T> = std::result::Result<T, ShelfError>;
