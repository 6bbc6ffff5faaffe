//! # Database: Durable Keyed Storage for Sessions and Player Records
//!
//! Two independent namespaces share one [`Backend`]:
//!
//! - `sessions`: session id → [`GameSession`](crate::session::GameSession)
//! - `players`: player id → [`PlayerRecord`](crate::leaderboard::PlayerRecord)
//!
//! ## Atomicity
//!
//! Every write goes through [`Namespace::update`], which holds the per-key
//! lock from [`locks::KeyedLocks`] across the whole read-compute-write. Two
//! callers touching the same key are serialized; callers on different keys
//! never contend. Reads take no lock: the backends only ever expose a whole
//! old value or a whole new one.
//!
//! ## Envelope
//!
//! Each value is stored as `{ "checksum", "lastUpdated", "data" }` with a
//! SHA-256 of the exact `data` text as written. The checksum is verified
//! against the stored bytes, never a re-encoding. A mismatch is reported as a
//! storage error on keyed access and skipped (with a warning) when listing.
//!
//! ## Module Structure
//!
//! - [`backend`]: `Backend` trait, `FileBackend`, `MemoryBackend`
//! - [`locks`]: per-key lock table
//! - `sessions` / `players`: domain helpers on [`Database`]

pub mod backend;
pub mod locks;
mod players;
mod sessions;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::leaderboard::PlayerRecord;
use crate::session::GameSession;
pub use backend::{Backend, FileBackend, MemoryBackend};
use locks::KeyedLocks;

pub const SESSIONS: &str = "sessions";
pub const PLAYERS: &str = "players";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    checksum: String,
    last_updated: DateTime<Utc>,
    data: Box<RawValue>,
}

/// Compute SHA-256 hex digest of a string.
fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// All values of one namespace at a point in time.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub name: &'static str,
    pub entries: BTreeMap<String, T>,
    /// Newest write among the entries.
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T: Serialize> Snapshot<T> {
    /// Single-document layout: `{ "<name>": { key: value }, "lastUpdated": ts }`.
    pub fn to_document(&self) -> Result<serde_json::Value> {
        let mut doc = serde_json::Map::new();
        doc.insert(self.name.to_string(), serde_json::to_value(&self.entries)?);
        doc.insert(
            "lastUpdated".to_string(),
            serde_json::to_value(self.last_updated)?,
        );
        Ok(serde_json::Value::Object(doc))
    }
}

/// Typed view over one namespace of a backend.
pub struct Namespace<T> {
    name: &'static str,
    backend: Arc<dyn Backend>,
    locks: KeyedLocks,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Namespace<T> {
    fn new(name: &'static str, backend: Arc<dyn Backend>) -> Self {
        Namespace {
            name,
            backend,
            locks: KeyedLocks::new(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Result<(T, DateTime<Utc>)> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .with_context(|| format!("corrupt {} record {}", self.name, key))?;
        let data = envelope.data.get();
        if sha256_hex(data) != envelope.checksum {
            anyhow::bail!("checksum mismatch for {} record {}", self.name, key);
        }
        let value = serde_json::from_str(data)
            .with_context(|| format!("malformed {} record {}", self.name, key))?;
        Ok((value, envelope.last_updated))
    }

    fn encode(value: &T) -> Result<Vec<u8>> {
        let data = serde_json::value::to_raw_value(value)?;
        let envelope = Envelope {
            checksum: sha256_hex(data.get()),
            last_updated: Utc::now(),
            data,
        };
        Ok(serde_json::to_vec_pretty(&envelope)?)
    }

    fn read(&self, key: &str) -> Result<Option<T>> {
        match self.backend.read(self.name, key)? {
            Some(bytes) => Ok(Some(self.decode(key, &bytes)?.0)),
            None => Ok(None),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<T>> {
        self.read(key)
    }

    pub fn put(&self, key: &str, value: &T) -> Result<()> {
        let bytes = Self::encode(value)?;
        self.locks
            .with_lock(key, || self.backend.write(self.name, key, &bytes))
    }

    /// Atomic read-modify-write on one key.
    ///
    /// `f` sees the current value (or `None`) and returns the value to store
    /// plus an extra result for the caller. If `f` fails, nothing is written.
    pub fn update<R, E>(
        &self,
        key: &str,
        f: impl FnOnce(Option<T>) -> std::result::Result<(T, R), E>,
    ) -> std::result::Result<(T, R), E>
    where
        E: From<anyhow::Error>,
    {
        self.locks.with_lock(key, || {
            let current = self.read(key)?;
            let (next, extra) = f(current)?;
            let bytes = Self::encode(&next)?;
            self.backend.write(self.name, key, &bytes)?;
            Ok((next, extra))
        })
    }

    /// Apply `f` to the current value, or to `default()` if the key is absent.
    pub fn transact(
        &self,
        key: &str,
        default: impl FnOnce() -> T,
        f: impl FnOnce(&mut T),
    ) -> Result<T> {
        let (value, ()) = self.update(key, |current| {
            let mut value = current.unwrap_or_else(default);
            f(&mut value);
            Ok::<_, anyhow::Error>((value, ()))
        })?;
        Ok(value)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        self.locks
            .with_lock(key, || self.backend.remove(self.name, key))
    }

    /// Remove `key` only if its current value satisfies `pred`, under the
    /// key lock.
    pub fn remove_if(&self, key: &str, pred: impl FnOnce(&T) -> bool) -> Result<bool> {
        self.locks.with_lock(key, || match self.read(key)? {
            Some(value) if pred(&value) => self.backend.remove(self.name, key),
            _ => Ok(false),
        })
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.backend.keys(self.name)
    }

    /// Read every entry. Corrupt entries are logged and left out; backend
    /// I/O failures are returned.
    pub fn snapshot(&self) -> Result<Snapshot<T>> {
        let mut entries = BTreeMap::new();
        let mut last_updated: Option<DateTime<Utc>> = None;
        for key in self.keys()? {
            let Some(bytes) = self.backend.read(self.name, &key)? else {
                continue;
            };
            match self.decode(&key, &bytes) {
                Ok((value, ts)) => {
                    last_updated = Some(last_updated.map_or(ts, |cur| cur.max(ts)));
                    entries.insert(key, value);
                }
                Err(e) => warn!(namespace = self.name, key = %key, error = %e, "skipping unreadable record"),
            }
        }
        Ok(Snapshot {
            name: self.name,
            entries,
            last_updated,
        })
    }
}

pub struct Database {
    backend: Arc<dyn Backend>,
    pub sessions: Namespace<GameSession>,
    pub players: Namespace<PlayerRecord>,
}

impl Database {
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Database {
            sessions: Namespace::new(SESSIONS, backend.clone()),
            players: Namespace::new(PLAYERS, backend.clone()),
            backend,
        }
    }

    /// Open (or create) a file-backed store rooted at `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        Ok(Self::with_backend(Arc::new(FileBackend::open(data_dir)?)))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    /// Used by the `/readyz` probe.
    pub fn health_check(&self) -> Result<()> {
        self.backend.health_check()
    }
}
