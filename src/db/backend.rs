//! Raw byte storage behind the typed namespaces.
//!
//! [`FileBackend`] keeps one JSON file per key under `<root>/<namespace>/`,
//! written atomically via a `.tmp` file and rename. File names are the
//! percent-encoded key; keys whose encoding exceeds [`MAX_ENCODED_KEY`] can
//! never be stored, so they read as absent and fail on write.
//! [`MemoryBackend`] is the same contract over a `HashMap`, for tests and
//! throwaway servers.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::locks::lock_or_recover;

pub trait Backend: Send + Sync {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, namespace: &str, key: &str, bytes: &[u8]) -> Result<()>;
    /// Returns true if something was removed.
    fn remove(&self, namespace: &str, key: &str) -> Result<bool>;
    fn keys(&self, namespace: &str) -> Result<Vec<String>>;
    fn health_check(&self) -> Result<()>;
}

// ── File backend ────────────────────────────────────────────────

/// Longest encoded key that still fits `<key>.json.tmp` in a 255-byte file
/// name.
pub const MAX_ENCODED_KEY: usize = 240;

pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create data dir {}", root.display()))?;
        Ok(FileBackend { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    /// `None` when the key is too long to have a file.
    fn path_for(&self, namespace: &str, key: &str) -> Result<Option<PathBuf>> {
        if key.is_empty() {
            anyhow::bail!("empty storage key in namespace {}", namespace);
        }
        let encoded = encode_key(key);
        if encoded.len() > MAX_ENCODED_KEY {
            return Ok(None);
        }
        Ok(Some(
            self.namespace_dir(namespace)
                .join(format!("{}.json", encoded)),
        ))
    }
}

impl Backend for FileBackend {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(namespace, key)? else {
            return Ok(None);
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn write(&self, namespace: &str, key: &str, bytes: &[u8]) -> Result<()> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let Some(path) = self.path_for(namespace, key)? else {
            anyhow::bail!(
                "storage key in namespace {} is too long ({} bytes)",
                namespace,
                key.len()
            );
        };
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to move {} into place", path.display()))?;
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        let Some(path) = self.path_for(namespace, key)? else {
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let dir = self.namespace_dir(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to list {}", dir.display()))
            }
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".json") {
                if let Some(key) = decode_key(stem) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn health_check(&self) -> Result<()> {
        let probe = self.root.join(".health");
        fs::write(&probe, b"ok")
            .with_context(|| format!("data dir {} is not writable", self.root.display()))?;
        let _ = fs::remove_file(&probe);
        Ok(())
    }
}

fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(name: &str) -> Option<String> {
    urlencoding::decode(name).ok().map(|key| key.into_owned())
}

// ── Memory backend ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = lock_or_recover(&self.entries);
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn write(&self, namespace: &str, key: &str, bytes: &[u8]) -> Result<()> {
        lock_or_recover(&self.entries)
            .insert((namespace.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(lock_or_recover(&self.entries)
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = lock_or_recover(&self.entries)
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
