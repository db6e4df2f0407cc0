//! Core library for perishable inventory tracking.
//!
//! This crate provides:
//! - A text recognizer boundary for label photos (pure Rust OCR on native targets)
//! - Expiry date extraction from noisy recognized text (scanning, normalization, scoring)
//! - Inventory records with pluggable stores
//! - A rule-based waste risk scorer
//! - Expiry alert digests and notifiers

pub mod alerts;
pub mod error;
pub mod expiry;
pub mod inventory;
pub mod models;
pub mod ocr;
pub mod risk;

pub use alerts::{build_alerts, send_due_alerts, Alert, AlertDigest, LogNotifier, Notifier, OutboxNotifier};
pub use error::{InventoryError, NotifyError, RecognizerError, Result, ShelfError};
pub use expiry::{ExpiryExtractor, ExpiryParser, ExtractionMethod, ExtractionResult};
pub use expiry::rules::{normalize_date, DateCandidate};
pub use inventory::{
    expire_overdue, InventoryItem, InventoryStore, ItemStatus, JsonFileStore, MemoryStore, NewItem,
};
pub use models::config::ShelfConfig;
pub use ocr::{RecognizedText, TextRecognizer};
pub use risk::{RiskFeatures, RiskScorer, RuleBasedScorer};

#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
