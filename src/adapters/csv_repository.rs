//! CSV file implementation of the q-table repository.

use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{
    Result,
    error::Error,
    ports::QTableRepository,
    q_learning::{QTable, read_table, write_table},
};

const EXTENSION: &str = "csv";

/// File stem for a table saved after `episodes` episodes.
pub fn table_file_stem(episodes: u64) -> String {
    format!("qvalues_{episodes}")
}

/// `path` with a `.csv` extension appended unless it already has one.
///
/// Appends rather than replaces, so `qvalues_0.5` becomes `qvalues_0.5.csv`.
pub fn with_csv_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(EXTENSION) => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// The `attempt`-th candidate name for `target`: the target itself, then
/// `<stem>_1.csv`, `<stem>_2.csv`, and so on.
pub fn candidate_path(target: &Path, attempt: usize) -> PathBuf {
    if attempt == 0 {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{stem}_{attempt}.{EXTENSION}"))
}

/// CSV-based q-table repository.
///
/// Saves create the parent directory when absent and never overwrite an
/// existing file: the first free candidate from [`candidate_path`] is used.
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
/// let path = repo.save(&QTable::new(), Path::new("results/qvalues_4000"))?;
/// assert_eq!(path, Path::new("results/qvalues_4000.csv"));
/// # Ok::<(), flappy::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRepository;

impl CsvRepository {
    pub fn new() -> Self {
        Self
    }

    fn create_unique(target: &Path) -> Result<(PathBuf, File)> {
        let mut attempt = 0;
        loop {
            let candidate = candidate_path(target, attempt);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying next name", candidate.display());
                    attempt += 1;
                }
                Err(source) => {
                    return Err(Error::Io {
                        operation: format!("create file {candidate:?}"),
                        source,
                    });
                }
            }
        }
    }

    /// Write `table` to the freshly created `path`, removing the file if the
    /// write fails so no truncated table is left behind.
    fn write_or_discard<W: Write>(table: &QTable, path: &Path, writer: W) -> Result<()> {
        let result = write_table(table, writer);
        if result.is_err() {
            if let Err(e) = fs::remove_file(path) {
                warn!("could not remove partial table {}: {e}", path.display());
            }
        }
        result
    }
}

impl QTableRepository for CsvRepository {
    fn save(&self, table: &QTable, path: &Path) -> Result<PathBuf> {
        let target = with_csv_extension(path);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                operation: format!("create directory {parent:?}"),
                source,
            })?;
        }

        let (written, file) = Self::create_unique(&target)?;
        Self::write_or_discard(table, &written, BufWriter::new(file))?;
        info!("saved {} q-table rows to {}", table.size(), written.display());
        Ok(written)
    }

    fn load(&self, path: &Path) -> Result<QTable> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        let table = read_table(BufReader::new(file))?;
        info!("loaded {} q-table rows from {}", table.size(), path.display());
        Ok(table)
    }
}
