//! Perishable inventory records and stores.

mod dates;
mod json_store;

pub use dates::{days_until, is_future_or_today};
pub use json_store::JsonFileStore;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Lifecycle state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// On the shelf.
    #[default]
    Active,
    /// Used up.
    Consumed,
    /// Thrown away past its date.
    Expired,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Consumed => "consumed",
            ItemStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ItemStatus::Active),
            "consumed" => Ok(ItemStatus::Consumed),
            "expired" => Ok(ItemStatus::Expired),
            other => Err(InventoryError::InvalidItem(format!("unknown status: {}", other))),
        }
    }
}

/// A tracked perishable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Store-assigned identifier.
    pub id: u64,
    /// Product name.
    pub name: String,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Number of units.
    pub quantity: u32,
    /// Label photo the expiry date was read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    /// Predicted waste risk (0.0 - 1.0).
    pub risk_score: f32,
    /// Lifecycle state.
    pub status: ItemStatus,
    /// When the item was added.
    pub added_at: DateTime<Utc>,
    /// When the item was marked consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<DateTime<Utc>>,
}

/// Fields supplied when adding an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
    pub image_path: Option<PathBuf>,
    pub risk_score: f32,
}

impl NewItem {
    pub fn new(name: impl Into<String>, expiry_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            expiry_date,
            quantity: 1,
            image_path: None,
            risk_score: 0.0,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_risk_score(mut self, score: f32) -> Self {
        self.risk_score = score;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::InvalidItem("name is empty".to_string()));
        }
        if self.quantity == 0 {
            return Err(InventoryError::InvalidItem("quantity must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.risk_score) {
            return Err(InventoryError::InvalidItem(format!(
                "risk score {} outside 0..1",
                self.risk_score
            )));
        }
        Ok(())
    }
}

/// Create, list, update and delete inventory items.
pub trait InventoryStore {
    /// Add an item and return it with its assigned id.
    fn create(&mut self, item: NewItem) -> Result<InventoryItem>;

    /// Items ordered by expiry date, optionally filtered by status.
    fn list(&self, status: Option<ItemStatus>) -> Result<Vec<InventoryItem>>;

    /// Change an item's status. Marking consumed records the time.
    fn update_status(&mut self, id: u64, status: ItemStatus) -> Result<InventoryItem>;

    /// Remove an item.
    fn delete(&mut self, id: u64) -> Result<()>;
}

/// Mark active items whose date has passed as expired. Returns how many changed.
pub fn expire_overdue<S: InventoryStore + ?Sized>(store: &mut S, today: NaiveDate) -> Result<usize> {
    let overdue: Vec<u64> = store
        .list(Some(ItemStatus::Active))?
        .into_iter()
        .filter(|item| !is_future_or_today(item.expiry_date, today))
        .map(|item| item.id)
        .collect();
    for id in &overdue {
        store.update_status(*id, ItemStatus::Expired)?;
    }
    Ok(overdue.len())
}

/// In-memory store; also the state persisted by [`JsonFileStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    next_id: u64,
    items: BTreeMap<u64, InventoryItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl InventoryStore for MemoryStore {
    fn create(&mut self, item: NewItem) -> Result<InventoryItem> {
        item.validate()?;

        self.next_id += 1;
        let record = InventoryItem {
            id: self.next_id,
            name: item.name.trim().to_string(),
            expiry_date: item.expiry_date,
            quantity: item.quantity,
            image_path: item.image_path,
            risk_score: item.risk_score,
            status: ItemStatus::Active,
            added_at: Utc::now(),
            consumed_at: None,
        };
        self.items.insert(record.id, record.clone());
        Ok(record)
    }

    fn list(&self, status: Option<ItemStatus>) -> Result<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self
            .items
            .values()
            .filter(|item| status.is_none_or(|s| item.status == s))
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.expiry_date, item.id));
        Ok(items)
    }

    fn update_status(&mut self, id: u64, status: ItemStatus) -> Result<InventoryItem> {
        let item = self.items.get_mut(&id).ok_or(InventoryError::NotFound(id))?;
        item.status = status;
        if status == ItemStatus::Consumed {
            item.consumed_at = Some(Utc::now());
        }
        Ok(item.clone())
    }

    fn delete(&mut self, id: u64) -> Result<()> {
        self.items
            .remove(&id)
            .map(|_| ())
            .ok_or(InventoryError::NotFound(id))
    }
}
