//! Inventory store persisted as a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{InventoryItem, InventoryStore, ItemStatus, MemoryStore, NewItem, Result};

/// Inventory store that rewrites a JSON file after every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            MemoryStore::new()
        };
        debug!("Opened inventory store {} ({} items)", path.display(), inner.len());
        Ok(Self { path, inner })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy, write it out, and only then keep it.
    fn commit<T>(&mut self, change: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let mut next = self.inner.clone();
        let value = change(&mut next)?;
        save(&self.path, &next)?;
        self.inner = next;
        Ok(value)
    }
}

fn save(path: &Path, store: &MemoryStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(store)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl InventoryStore for JsonFileStore {
    fn create(&mut self, item: NewItem) -> Result<InventoryItem> {
        self.commit(|store| store.create(item))
    }

    fn list(&self, status: Option<ItemStatus>) -> Result<Vec<InventoryItem>> {
        self.inner.list(status)
    }

    fn update_status(&mut self, id: u64, status: ItemStatus) -> Result<InventoryItem> {
        self.commit(|store| store.update_status(id, status))
    }

    fn delete(&mut self, id: u64) -> Result<()> {
        self.commit(|store| store.delete(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_changes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("inventory.json");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .create(NewItem::new("Milk", date(2026, 3, 1)).with_quantity(2))
                .unwrap();
            let cheese = store.create(NewItem::new("Cheese", date(2026, 5, 1))).unwrap();
            store.update_status(cheese.id, ItemStatus::Consumed).unwrap();
        }

        let mut store = JsonFileStore::open(&path).unwrap();
        let items = store.list(None).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].status, ItemStatus::Consumed);

        // ids keep counting after reopen
        let eggs = store.create(NewItem::new("Eggs", date(2026, 4, 1))).unwrap();
        assert_eq!(eggs.id, 3);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(InventoryError::Serde(_))));
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        // parent directory cannot be created over a plain file
        let mut store = JsonFileStore::open(blocker.join("inventory.json")).unwrap();
        let result = store.create(NewItem::new("Milk", date(2026, 3, 1)));

        assert!(matches!(result, Err(InventoryError::Io(_))));
        assert!(store.list(None).unwrap().is_empty());
    }
}
