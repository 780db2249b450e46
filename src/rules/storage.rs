//! Durable rule-file storage.
//!
//! # Responsibilities
//! - Enumerate the domains that have a stored rule file
//! - Read and write one domain's rule file bytes
//!
//! # Design Decisions
//! - One `<domain>.json` file per domain in a flat directory
//! - A missing file is `Ok(None)`, not an error; only real I/O failures error
//! - Storage knows nothing about rule semantics; it moves bytes

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::rules::error::RuleError;

/// Extension of rule files inside the rules directory.
pub const RULE_FILE_EXTENSION: &str = "json";

/// Backing store for per-domain rule files.
pub trait RuleStorage: Send + Sync + std::fmt::Debug {
    /// Domains with a stored rule file.
    fn list_domains(&self) -> Result<Vec<String>, RuleError>;

    /// Raw rule file bytes for `domain`, or `None` if nothing is stored.
    fn read(&self, domain: &str) -> Result<Option<Vec<u8>>, RuleError>;

    /// Replace the stored rule file for `domain`.
    fn write(&self, domain: &str, contents: &[u8]) -> Result<(), RuleError>;

    /// Human-readable location of `domain`'s rule file, for diagnostics.
    fn location(&self, domain: &str) -> String;
}

/// Reject domains that cannot safely name a rule file.
pub fn validate_domain(domain: &str) -> Result<(), RuleError> {
    let invalid = domain.is_empty()
        || domain == "."
        || domain == ".."
        || domain
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());
    if invalid {
        return Err(RuleError::InvalidDomain(domain.to_string()));
    }
    Ok(())
}

/// Rule files kept as `<domain>.json` in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    dir: PathBuf,
}

impl DirectoryStorage {
    /// Open `dir`, creating it if it does not exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RuleError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| RuleError::Storage {
                location: dir.display().to_string(),
                source,
            })?;
            tracing::info!(dir = %dir.display(), "Created rules directory");
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", domain, RULE_FILE_EXTENSION))
    }
}

impl RuleStorage for DirectoryStorage {
    fn list_domains(&self) -> Result<Vec<String>, RuleError> {
        let storage_err = |source| RuleError::Storage {
            location: self.dir.display().to_string(),
            source,
        };

        let mut domains = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(storage_err)? {
            let entry = entry.map_err(storage_err)?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(RULE_FILE_EXTENSION) {
                continue;
            }
            if let Some(domain) = path.file_stem().and_then(|s| s.to_str()) {
                domains.push(domain.to_string());
            }
        }
        domains.sort();
        Ok(domains)
    }

    fn read(&self, domain: &str) -> Result<Option<Vec<u8>>, RuleError> {
        let path = self.path_for(domain);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RuleError::Storage {
                location: path.display().to_string(),
                source,
            }),
        }
    }

    fn write(&self, domain: &str, contents: &[u8]) -> Result<(), RuleError> {
        let path = self.path_for(domain);
        fs::write(&path, contents).map_err(|source| RuleError::Storage {
            location: path.display().to_string(),
            source,
        })
    }

    fn location(&self, domain: &str) -> String {
        self.path_for(domain).display().to_string()
    }
}

/// In-memory storage that counts accesses.
///
/// Reads of chosen domains, and listing, can be made to fail with an I/O
/// error to exercise the store's failure handling.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    failing_reads: RwLock<BTreeSet<String>>,
    failing_list: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `contents` for `domain` without counting it as a write.
    pub fn insert(&self, domain: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(domain.into(), contents.into());
    }

    /// Stored bytes for `domain`, without counting it as a read.
    pub fn get(&self, domain: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(domain)
            .cloned()
    }

    /// Make every later read of `domain` fail.
    pub fn fail_reads_of(&self, domain: impl Into<String>) {
        self.failing_reads
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(domain.into());
    }

    /// Make `list_domains` fail (or succeed again).
    pub fn set_list_failure(&self, fail: bool) {
        self.failing_list.store(fail, Ordering::SeqCst);
    }

    /// Number of single-domain reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of writes served so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn unavailable(location: String) -> RuleError {
    RuleError::Storage {
        location,
        source: std::io::Error::other("storage unavailable"),
    }
}

impl RuleStorage for MemoryStorage {
    fn list_domains(&self) -> Result<Vec<String>, RuleError> {
        if self.failing_list.load(Ordering::SeqCst) {
            return Err(unavailable("memory:".to_string()));
        }
        Ok(self
            .files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }

    fn read(&self, domain: &str) -> Result<Option<Vec<u8>>, RuleError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_reads
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(domain);
        if failing {
            return Err(unavailable(self.location(domain)));
        }
        Ok(self.get(domain))
    }

    fn write(&self, domain: &str, contents: &[u8]) -> Result<(), RuleError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(domain, contents);
        Ok(())
    }

    fn location(&self, domain: &str) -> String {
        format!("memory:{}.{}", domain, RULE_FILE_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_validation() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("[::1]").is_ok());
        assert!(validate_domain("Example.COM").is_ok());
        assert!(matches!(validate_domain(""), Err(RuleError::InvalidDomain(_))));
        assert!(validate_domain("../etc/passwd").is_err());
        assert!(validate_domain("a\\b").is_err());
        assert!(validate_domain("a\nb").is_err());
        assert!(matches!(validate_domain(".."), Err(RuleError::InvalidDomain(_))));
        assert!(validate_domain(".").is_err());
        assert!(validate_domain("...").is_ok());
    }

    #[test]
    fn open_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("rules");
        let storage = DirectoryStorage::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(storage.dir(), dir.as_path());
    }

    #[test]
    fn lists_only_json_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.example.json"), "{}").unwrap();
        fs::write(tmp.path().join("b.example.json"), "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignore me").unwrap();
        fs::create_dir(tmp.path().join("dir.json")).unwrap();

        let storage = DirectoryStorage::open(tmp.path()).unwrap();
        assert_eq!(
            storage.list_domains().unwrap(),
            vec!["a.example".to_string(), "b.example".to_string()]
        );
    }

    #[test]
    fn read_missing_is_none_and_write_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = DirectoryStorage::open(tmp.path()).unwrap();

        assert!(storage.read("example.com").unwrap().is_none());

        storage.write("example.com", b"{\"rules\":[]}").unwrap();
        assert!(tmp.path().join("example.com.json").is_file());
        assert_eq!(
            storage.read("example.com").unwrap().as_deref(),
            Some(&b"{\"rules\":[]}"[..])
        );
    }

    #[test]
    fn listing_a_vanished_directory_is_a_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("rules");
        let storage = DirectoryStorage::open(&dir).unwrap();
        fs::remove_dir(&dir).unwrap();

        assert!(matches!(
            storage.list_domains(),
            Err(RuleError::Storage { .. })
        ));
    }

    #[test]
    fn memory_storage_counts_reads_and_writes() {
        let storage = MemoryStorage::new();
        storage.insert("a", "x");
        assert_eq!(storage.read("a").unwrap().as_deref(), Some(&b"x"[..]));
        assert!(storage.read("b").unwrap().is_none());
        storage.write("b", b"y").unwrap();

        assert_eq!(storage.reads(), 2);
        assert_eq!(storage.writes(), 1);
        assert_eq!(storage.list_domains().unwrap(), vec!["a", "b"]);
    }
}
