//! Durable storage of the whole [`Table`] in one backing file.
//!
//! A save is:
//!
//! 1. resolve the absolute path and make sure its directory exists;
//! 2. copy the current file (if any) to `<path>.bak.<YYYYMMDD_HHMMSS>`. A
//!    failed copy aborts the save and leaves the file untouched;
//! 3. keep only the newest `retention` backups (failures are logged only);
//! 4. write a temporary file next to the target and rename it over the
//!    target. The temporary file is removed on every early exit.
//!
//! Two processes saving the same file race at the rename; the last one wins.

use std::{
    ffi::OsString,
    fmt, fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::Local;
use tempfile::NamedTempFile;

use crate::{
    LoadError, SaveError, Table,
    codec::{CsvCodec, TableCodec},
};

/// Number of backups kept when nothing else is configured.
pub const DEFAULT_RETENTION: usize = 5;

const BACKUP_MARKER: &str = ".bak.";
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Result of a successful save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveInfo {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
    /// Old backups deleted by rotation.
    pub purged: usize,
}

impl fmt::Display for SaveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "saved {}", self.path.display())?;
        if let Some(backup) = &self.backup {
            write!(f, " (backup {})", backup.display())?;
        }
        Ok(())
    }
}

/// Reads and writes the backing file through a [`TableCodec`].
#[derive(Clone, Debug)]
pub struct Persistence<C = CsvCodec> {
    path: PathBuf,
    retention: usize,
    codec: C,
}

impl Persistence<CsvCodec> {
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::new(path, CsvCodec::default())
    }
}

impl<C: TableCodec> Persistence<C> {
    pub fn new(path: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            path: path.into(),
            retention: DEFAULT_RETENTION,
            codec,
        }
    }

    /// Number of backups to keep. Zero keeps none.
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Reads the whole backing file. A missing file is an error.
    pub fn load(&self) -> Result<Table, LoadError> {
        let io_error = |source| LoadError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::Missing(self.path.clone()));
            }
            Err(err) => return Err(io_error(err)),
        };
        if file.metadata().map_err(io_error)?.is_dir() {
            return Err(io_error(io::Error::other("path is a directory")));
        }
        self.codec.read(&mut file)
    }

    /// Writes `table` atomically, rotating backups first.
    pub fn save(&self, table: &Table) -> Result<SaveInfo, SaveError> {
        let path = std::path::absolute(&self.path).map_err(|source| SaveError::ResolvePath {
            path: self.path.clone(),
            source,
        })?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).map_err(|source| SaveError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let previous = fs::metadata(&path).ok();
        let backup = match previous {
            Some(_) => Some(backup_file(&path)?),
            None => None,
        };
        let purged = purge_backups(&path, self.retention);
        // With a small retention the fresh backup may be purged right away.
        let backup = backup.filter(|backup| backup.exists());

        let mut temp = NamedTempFile::new_in(&dir).map_err(|source| SaveError::Write {
            path: dir.clone(),
            source,
        })?;
        let write_error = |source| SaveError::Write {
            path: path.clone(),
            source,
        };
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.codec.write(table, &mut writer).map_err(write_error)?;
            writer.flush().map_err(write_error)?;
        }
        temp.as_file().sync_all().map_err(write_error)?;

        if let Some(metadata) = &previous
            && let Err(err) = fs::set_permissions(temp.path(), metadata.permissions())
        {
            tracing::warn!("cannot carry permissions over to {}: {err}", path.display());
        }

        temp.persist(&path).map_err(|err| SaveError::Rename {
            path: path.clone(),
            source: err.error,
        })?;

        let info = SaveInfo {
            path,
            backup,
            purged,
        };
        tracing::info!("{info}");
        Ok(info)
    }

    /// Existing backups of the backing file, oldest first.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let path = std::path::absolute(&self.path)?;
        list_backups(&path)
    }
}

/// Copies `path` to a fresh `<path>.bak.<stamp>` name and returns it.
fn backup_file(path: &Path) -> Result<PathBuf, SaveError> {
    let stamp = Local::now().format(BACKUP_STAMP_FORMAT).to_string();
    let mut backup = backup_path(path, &stamp);
    let mut counter = 1;
    // Second resolution: several saves in the same second get a counter.
    while backup.exists() {
        backup = backup_path(path, &format!("{stamp}-{counter}"));
        counter += 1;
    }

    fs::copy(path, &backup).map_err(|source| SaveError::Backup {
        path: backup.clone(),
        source,
    })?;

    // Rotation orders by modification time, which must be the copy time.
    if let Err(err) = fs::File::options()
        .write(true)
        .open(&backup)
        .and_then(|file| file.set_modified(SystemTime::now()))
    {
        tracing::warn!("cannot touch backup {}: {err}", backup.display());
    }

    Ok(backup)
}

fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_MARKER);
    name.push(stamp);
    PathBuf::from(name)
}

fn list_backups(path: &Path) -> io::Result<Vec<PathBuf>> {
    let Some(dir) = path.parent() else {
        return Ok(Vec::new());
    };
    let Some(file_name) = path.file_name() else {
        return Ok(Vec::new());
    };
    let prefix = format!("{}{BACKUP_MARKER}", file_name.to_string_lossy());

    let mut backups: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        backups.push((modified, entry.path()));
    }
    backups.sort();

    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Deletes the oldest backups beyond `retention`. Returns how many went away.
fn purge_backups(path: &Path, retention: usize) -> usize {
    let backups = match list_backups(path) {
        Ok(backups) => backups,
        Err(err) => {
            tracing::warn!("cannot list backups of {}: {err}", path.display());
            return 0;
        }
    };

    let excess = backups.len().saturating_sub(retention);
    let mut purged = 0;
    for old in backups.into_iter().take(excess) {
        match fs::remove_file(&old) {
            Ok(()) => purged += 1,
            Err(err) => tracing::warn!("cannot delete old backup {}: {err}", old.display()),
        }
    }
    purged
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{Amount, ExpenseRecord, IncomeRecord, table::Row};

    fn sample_table() -> Table {
        Table {
            extra_columns: Vec::new(),
            rows: vec![
                Row {
                    income: Some(IncomeRecord::new("Alice".to_string(), Amount::new(300_000))),
                    expense: Some(ExpenseRecord::new(
                        "Home".to_string(),
                        "Rent".to_string(),
                        Amount::new(120_000),
                        Amount::new(120_000),
                    )),
                    extras: Vec::new(),
                },
                Row {
                    income: None,
                    expense: Some(ExpenseRecord::new(
                        "Food".to_string(),
                        "Groceries".to_string(),
                        Amount::new(40_000),
                        Amount::ZERO,
                    )),
                    extras: Vec::new(),
                },
            ],
        }
    }

    struct FailingCodec;

    impl TableCodec for FailingCodec {
        fn read(&self, _reader: &mut dyn io::Read) -> Result<Table, LoadError> {
            Ok(Table::default())
        }

        fn write(&self, _table: &Table, _writer: &mut dyn Write) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn first_save_has_no_backup() {
        let dir = TempDir::new().unwrap();
        let persistence = Persistence::csv(dir.path().join("budget.csv"));

        let info = persistence.save(&sample_table()).unwrap();
        assert!(info.backup.is_none());
        assert!(info.path.is_absolute());
        assert_eq!(persistence.load().unwrap(), sample_table());
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let persistence = Persistence::csv(dir.path().join("nested/deeper/budget.csv"));

        persistence.save(&sample_table()).unwrap();
        assert!(dir.path().join("nested/deeper/budget.csv").is_file());
    }

    #[test]
    fn second_save_backs_up_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget.csv");
        let persistence = Persistence::csv(&path);

        persistence.save(&Table::default()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let info = persistence.save(&sample_table()).unwrap();
        let backup = info.backup.clone().unwrap();
        assert!(
            backup
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("budget.csv.bak.")
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), before);
        assert!(info.to_string().contains("backup"));
    }

    #[test]
    fn rotation_keeps_newest_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget.csv");
        let persistence = Persistence::csv(&path).with_retention(3);
        persistence.save(&Table::default()).unwrap();

        let mut made = Vec::new();
        for _ in 0..5 {
            let info = persistence.save(&sample_table()).unwrap();
            made.push(info.backup.unwrap());
        }

        let remaining = persistence.backups().unwrap();
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining, made[2..].to_vec());
    }

    #[test]
    fn zero_retention_reports_no_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget.csv");
        let persistence = Persistence::csv(&path).with_retention(0);
        persistence.save(&Table::default()).unwrap();

        let info = persistence.save(&sample_table()).unwrap();
        assert_eq!(info.backup, None);
        assert_eq!(info.purged, 1);
        assert!(!info.to_string().contains("backup"));
        assert!(persistence.backups().unwrap().is_empty());
    }

    #[test]
    fn empty_path_fails_resolving() {
        let err = Persistence::csv("").save(&sample_table()).unwrap_err();
        assert!(matches!(err, SaveError::ResolvePath { .. }));
        assert!(err.to_string().contains("resolving path"));
    }

    #[test]
    fn failed_backup_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget.csv");
        // A directory in place of the file cannot be copied.
        fs::create_dir(&path).unwrap();

        let err = Persistence::csv(&path).save(&sample_table()).unwrap_err();
        assert!(matches!(err, SaveError::Backup { .. }));
        assert!(path.is_dir());
    }

    #[test]
    fn failed_write_keeps_previous_file_and_cleans_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget.csv");
        Persistence::csv(&path).save(&sample_table()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = Persistence::new(&path, FailingCodec)
            .save(&Table::default())
            .unwrap_err();
        assert!(matches!(err, SaveError::Write { .. }));
        assert!(err.to_string().contains("writing"));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with("budget.csv"))
            .collect();
        assert!(leftovers.is_empty(), "temporary files left: {leftovers:?}");
    }

    #[test]
    fn load_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = Persistence::csv(dir.path().join("nope.csv"))
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Missing(_)));
    }
}
