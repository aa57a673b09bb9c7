//! In-memory q-table repository for testing.
//!
//! Tables are encoded with the same CSV row format as files, so tests cover
//! the codec without touching the file system.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use super::csv_repository::{candidate_path, with_csv_extension};
use crate::{
    Result,
    error::Error,
    ports::QTableRepository,
    q_learning::{QTable, read_table, write_table},
};

/// In-memory repository for testing.
///
/// Applies the same naming and collision rules as
/// [`CsvRepository`](super::CsvRepository). All clones share one store.
///
/// # Examples
///
/// ```
/// use flappy::adapters::InMemoryRepository;
/// use flappy::ports::QTableRepository;
/// use flappy::q_learning::QTable;
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let written = repo.save(&QTable::new(), Path::new("qvalues_10"))?;
/// let loaded = repo.load(&written)?;
/// assert!(loaded.is_empty());
/// # Ok::<(), flappy::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the number of tables currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    /// Clear all stored tables.
    pub fn clear(&self) {
        self.storage().clear();
    }

    /// Check if a table exists at the given path.
    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(path)
    }
}

impl QTableRepository for InMemoryRepository {
    fn save(&self, table: &QTable, path: &Path) -> Result<PathBuf> {
        let mut bytes = Vec::new();
        write_table(table, &mut bytes)?;

        let target = with_csv_extension(path);
        let mut storage = self.storage();
        let mut attempt = 0;
        let written = loop {
            let candidate = candidate_path(&target, attempt);
            if !storage.contains_key(&candidate) {
                break candidate;
            }
            attempt += 1;
        };
        storage.insert(written.clone(), bytes);
        Ok(written)
    }

    fn load(&self, path: &Path) -> Result<QTable> {
        let storage = self.storage();
        let bytes = storage.get(path).ok_or_else(|| Error::MissingTable {
            key: path.display().to_string(),
        })?;
        read_table(bytes.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, DiscreteKey};

    fn table() -> QTable {
        let mut table = QTable::new();
        table.set(DiscreteKey::new(4, 4, 4, -1).unwrap(), Action::NoOp, 2.0);
        table
    }

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let path = Path::new("test_table");

        assert_eq!(repo.count(), 0);

        let written = repo.save(&table(), path).unwrap();
        assert_eq!(written, PathBuf::from("test_table.csv"));
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(&written));

        assert_eq!(repo.load(&written).unwrap(), table());
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let repo = InMemoryRepository::new();
        let path = Path::new("qvalues_5");
        let first = repo.save(&table(), path).unwrap();
        let second = repo.save(&table(), path).unwrap();
        assert_eq!(first, PathBuf::from("qvalues_5.csv"));
        assert_eq!(second, PathBuf::from("qvalues_5_1.csv"));
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        let result = repo.load(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(Error::MissingTable { .. })));
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();

        let written = repo1.save(&table(), Path::new("shared")).unwrap();
        assert_eq!(repo2.load(&written).unwrap(), table());

        repo2.clear();
        assert_eq!(repo1.count(), 0);
    }
}
