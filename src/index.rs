//! On-disk inventory and the two persisted path→value tables.
//!
//! The media tree itself (`year/month/day/<ts>_<name>`) is the source of
//! truth for file existence; `.owners.tsv` and `.hashes.tsv` live beside it
//! as flat, sorted, tab-separated tables. Every save is a full rewrite, so
//! an interrupted save can lose the latest increment but never leave a
//! half-written index.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;
use crate::naming;
use crate::schedule::ValidatedRead;

const OWNER_INDEX_FILE: &str = ".owners.tsv";
const HASH_INDEX_FILE: &str = ".hashes.tsv";

/// MD5 digest as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Storage and bookkeeping for the media root: the startup scan, physical
/// file IO, and the owner/hash tables. No scheduling logic lives here.
pub struct FileIndex {
    root: PathBuf,
    owners: BTreeMap<String, String>,
    hashes: BTreeMap<String, String>,
}

impl FileIndex {
    /// Open the media root, creating it if missing, and load both tables.
    /// Table entries whose file no longer exists are dropped silently.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        if !root.is_dir() {
            return Err(Error::BadRoot(root.display().to_string()));
        }
        let mut index = Self {
            root,
            owners: BTreeMap::new(),
            hashes: BTreeMap::new(),
        };
        index.owners = index.load_table(OWNER_INDEX_FILE);
        index.hashes = index.load_table(HASH_INDEX_FILE);
        Ok(index)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a queue-relative entry.
    pub fn absolute(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Recursively collect the relative paths of all eligible media files,
    /// sorted. Dotfiles, dot-directories, and non-whitelisted extensions
    /// are skipped.
    pub fn scan(&self) -> Vec<String> {
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if naming::has_allowed_extension(&rel) {
                out.push(rel);
            }
        }
        out.sort();
        out
    }

    pub fn owner_of(&self, rel: &str) -> Option<&str> {
        self.owners.get(rel).map(String::as_str)
    }

    pub fn record_owner(&mut self, rel: &str, client_id: &str) {
        self.owners.insert(rel.to_string(), client_id.to_string());
        self.save_owner_index();
    }

    pub fn record_hash(&mut self, rel: &str, hash_hex: &str) {
        self.hashes.insert(rel.to_string(), hash_hex.to_string());
        self.save_hash_index();
    }

    /// Drop an entry from both tables and persist.
    pub fn remove_entry(&mut self, rel: &str) {
        self.owners.remove(rel);
        self.hashes.remove(rel);
        self.save_owner_index();
        self.save_hash_index();
    }

    /// Write an uploaded payload under the media root, creating the
    /// calendar subdirectories as needed.
    pub fn write_media(&self, rel: &str, bytes: &[u8]) -> Result<(), Error> {
        let absolute = self.absolute(rel);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&absolute, bytes)?;
        Ok(())
    }

    /// Remove the physical file. Missing files are not an error.
    pub fn delete_media(&self, rel: &str) -> Result<(), Error> {
        match fs::remove_file(self.absolute(rel)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %rel, "delete: file already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Search the whole media tree for a file with the given basename.
    pub fn find_by_file_name(&self, name: &str) -> Option<PathBuf> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .find(|e| e.file_name().to_string_lossy() == name)
            .map(|e| e.into_path())
    }

    fn load_table(&self, file: &str) -> BTreeMap<String, String> {
        let path = self.root.join(file);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(file, error = %err, "failed to read index; starting empty");
                return BTreeMap::new();
            }
        };
        let mut table = BTreeMap::new();
        for line in text.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((rel, value)) = line.split_once('\t') else {
                continue;
            };
            if self.absolute(rel).exists() {
                table.insert(rel.to_string(), value.to_string());
            }
        }
        table
    }

    fn save_table(&self, file: &str, table: &BTreeMap<String, String>) {
        let mut out = String::new();
        for (rel, value) in table {
            out.push_str(rel);
            out.push('\t');
            out.push_str(value);
            out.push('\n');
        }
        let write = fs::create_dir_all(&self.root).and_then(|_| fs::write(self.root.join(file), out));
        if let Err(err) = write {
            // In-memory state stays authoritative; the rewrite is retried on
            // the next mutation.
            warn!(file, error = %err, "failed to rewrite index");
        }
    }

    fn save_owner_index(&self) {
        self.save_table(OWNER_INDEX_FILE, &self.owners);
    }

    fn save_hash_index(&self) {
        self.save_table(HASH_INDEX_FILE, &self.hashes);
    }
}

impl ValidatedRead for FileIndex {
    /// Read the entry's bytes with integrity checking. With no hash on
    /// record the first successful read establishes it (trust-on-first-use);
    /// otherwise the recomputed digest must match, case-insensitively.
    fn read_validated(&mut self, rel: &str) -> Option<Vec<u8>> {
        if rel.trim().is_empty() {
            return None;
        }
        let bytes = match fs::read(self.absolute(rel)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %rel, error = %err, "failed to read file");
                return None;
            }
        };

        let expected = self.hashes.get(rel).cloned();
        match expected {
            None => {
                let digest = md5_hex(&bytes);
                self.hashes.insert(rel.to_string(), digest);
                self.save_hash_index();
                Some(bytes)
            }
            Some(expected) if expected.trim().is_empty() => {
                let digest = md5_hex(&bytes);
                self.hashes.insert(rel.to_string(), digest);
                self.save_hash_index();
                Some(bytes)
            }
            Some(expected) => {
                let current = md5_hex(&bytes);
                if current.eq_ignore_ascii_case(expected.trim()) {
                    Some(bytes)
                } else {
                    warn!(
                        path = %rel,
                        expected = %expected,
                        actual = %current,
                        "rejecting file: content hash mismatch"
                    );
                    None
                }
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
