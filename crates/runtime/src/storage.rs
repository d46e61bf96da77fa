//! Persisted session storage.
//!
//! The file store plays the part browser local storage plays for a web
//! client: one JSON file holds sessions under storage keys, and every
//! process pointed at the same file sees the same signed-in user.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use estate_protocol::Session;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

const STORAGE_SCHEMA_VERSION: u32 = 1;

pub trait SessionStorage: Send + Sync {
	fn load(&self) -> Result<Option<Session>>;

	fn save(&self, session: &Session) -> Result<()>;

	/// Removes the stored session, returning whether one was present.
	fn clear(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
	session: Session,
	saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageFile {
	schema: u32,
	#[serde(default)]
	entries: BTreeMap<String, StoredSession>,
}

impl Default for StorageFile {
	fn default() -> Self {
		Self {
			schema: STORAGE_SCHEMA_VERSION,
			entries: BTreeMap::new(),
		}
	}
}

/// JSON-file session storage keyed by storage key.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
	path: PathBuf,
	key: String,
}

impl FileSessionStorage {
	pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			key: key.into(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	fn read_file(&self) -> Result<StorageFile> {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(StorageFile::default()),
			Err(err) => return Err(err.into()),
		};

		match serde_json::from_str(&content) {
			Ok(file) => Ok(file),
			Err(err) => {
				warn!(
					target = "estate.session",
					path = %self.path.display(),
					error = %err,
					"ignoring unreadable session storage"
				);
				Ok(StorageFile::default())
			}
		}
	}

	fn write_file(&self, file: &StorageFile) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		let json = serde_json::to_string_pretty(file)?;
		let tmp = self.path.with_extension("json.tmp");
		fs::write(&tmp, json)?;
		fs::rename(&tmp, &self.path)?;
		Ok(())
	}
}

impl SessionStorage for FileSessionStorage {
	fn load(&self) -> Result<Option<Session>> {
		Ok(self.read_file()?.entries.remove(&self.key).map(|stored| stored.session))
	}

	fn save(&self, session: &Session) -> Result<()> {
		let mut file = self.read_file()?;
		file.schema = STORAGE_SCHEMA_VERSION;
		file.entries.insert(
			self.key.clone(),
			StoredSession {
				session: session.clone(),
				saved_at: Utc::now(),
			},
		);
		self.write_file(&file)?;
		debug!(target = "estate.session", key = %self.key, path = %self.path.display(), "session persisted");
		Ok(())
	}

	fn clear(&self) -> Result<bool> {
		let mut file = self.read_file()?;
		if file.entries.remove(&self.key).is_none() {
			return Ok(false);
		}
		self.write_file(&file)?;
		debug!(target = "estate.session", key = %self.key, "persisted session removed");
		Ok(true)
	}
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
	slot: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_session(session: Session) -> Self {
		Self {
			slot: Mutex::new(Some(session)),
		}
	}
}

impl SessionStorage for MemorySessionStorage {
	fn load(&self) -> Result<Option<Session>> {
		Ok(self.slot.lock().clone())
	}

	fn save(&self, session: &Session) -> Result<()> {
		*self.slot.lock() = Some(session.clone());
		Ok(())
	}

	fn clear(&self) -> Result<bool> {
		Ok(self.slot.lock().take().is_some())
	}
}
