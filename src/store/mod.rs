use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::models::{ItemFields, WishlistItem};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Storage(#[from] std::io::Error),
    #[error("item document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("item {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Validation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Item store backed by a single JSON document.
///
/// Every mutation reads the full document, transforms it in memory and
/// rewrites it atomically (temp file + rename). The mutex serializes the
/// whole read-modify-write cycle, so overlapping requests cannot clobber
/// each other's writes; it is released on every exit path because the
/// guard is scoped to the method body.
pub struct ItemStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path: PathBuf = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// All items in insertion order. A missing document is the empty
    /// collection; a malformed one is an error, never silently recovered.
    pub fn list(&self) -> StoreResult<Vec<WishlistItem>> {
        let _guard = self.lock.lock().unwrap();
        self.read_document()
    }

    pub fn create(&self, fields: ItemFields) -> StoreResult<WishlistItem> {
        let title = validate_title(&fields.title)?;
        let _guard = self.lock.lock().unwrap();
        let mut items = self.read_document()?;
        let item = WishlistItem {
            id: next_id(&items),
            title,
            url: fields.url,
            price: fields.price,
            note: fields.note,
            image: fields.image,
            date_added: Utc::now(),
            date_updated: None,
        };
        items.push(item.clone());
        self.write_document(&items)?;
        Ok(item)
    }

    /// Full replace of the mutable fields. The image reference is only
    /// replaced when a new one is supplied; otherwise the existing one
    /// survives (clients omitting the field must not lose the image).
    pub fn update(&self, id: i64, fields: ItemFields) -> StoreResult<WishlistItem> {
        let title = validate_title(&fields.title)?;
        let _guard = self.lock.lock().unwrap();
        let mut items = self.read_document()?;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.title = title;
        item.url = fields.url;
        item.price = fields.price;
        item.note = fields.note;
        if let Some(image) = fields.image {
            item.image = Some(image);
        }
        item.date_updated = Some(Utc::now());
        let updated = item.clone();
        self.write_document(&items)?;
        Ok(updated)
    }

    /// Set the image reference on a freshly created item.
    ///
    /// Ids are store-assigned, so a create with an upload runs create,
    /// then image persist, then this. Unlike `update` it does not stamp
    /// `dateUpdated`; the item has never been edited.
    pub fn attach_image(&self, id: i64, reference: &str) -> StoreResult<WishlistItem> {
        let _guard = self.lock.lock().unwrap();
        let mut items = self.read_document()?;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.image = Some(reference.to_string());
        let updated = item.clone();
        self.write_document(&items)?;
        Ok(updated)
    }

    /// Remove the item with the given id. Absence is not an error: the
    /// result says whether anything was removed, and both outcomes are
    /// success (delete is idempotent).
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let _guard = self.lock.lock().unwrap();
        let mut items = self.read_document()?;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write_document(&items)?;
        Ok(true)
    }

    fn read_document(&self) -> StoreResult<Vec<WishlistItem>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            // First run: no document yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Storage(e)),
        };
        Ok(serde_json::from_str(&json)?)
    }

    fn write_document(&self, items: &[WishlistItem]) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(items)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Storage(e.error))?;
        Ok(())
    }
}

/// Validate a client-supplied title, returning the trimmed value.
///
/// Also used by the transport layer to reject a doomed update before any
/// image write happens for it.
pub fn validate_title(title: &str) -> StoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}

/// Time-derived but collision-free: the id is the current epoch millis
/// unless an existing item already carries one at least that large, in
/// which case the next free integer is used instead.
fn next_id(items: &[WishlistItem]) -> i64 {
    let now = Utc::now().timestamp_millis();
    let max = items.iter().map(|i| i.id).max().unwrap_or(0);
    now.max(max + 1)
}
