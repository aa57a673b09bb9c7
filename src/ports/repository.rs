//! Repository port for q-table persistence.

use std::path::{Path, PathBuf};

use crate::{Result, q_learning::QTable};

/// Port for persisting and loading value tables.
///
/// # Examples
///
/// ```no_run
/// use flappy::adapters::CsvRepository;
/// use flappy::ports::QTableRepository;
/// use flappy::q_learning::QTable;
/// use std::path::Path;
///
/// let repo = CsvRepository::new();
/// let written = repo.save(&QTable::new(), Path::new("results/qvalues_4000"))?;
/// let loaded = repo.load(&written)?;
/// # Ok::<(), flappy::Error>(())
/// ```
pub trait QTableRepository {
    /// Save a table.
    ///
    /// Never overwrites: if `path` is taken, a distinct name is chosen
    /// deterministically. Returns the location actually written.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be created or written.
    fn save(&self, table: &QTable, path: &Path) -> Result<PathBuf>;

    /// Load a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the location is missing or unreadable, or if any
    /// row is malformed.
    fn load(&self, path: &Path) -> Result<QTable>;
}
