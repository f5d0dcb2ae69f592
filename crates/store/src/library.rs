//! The saved-meme library.
//!
//! All saved memes live as one JSON array under [`STORAGE_KEY`]. The
//! library reads it lazily on first access and keeps an in-memory copy.
//! Durable writes are best-effort: a failed write is logged and the
//! in-memory copy still reflects the change.

use memeforge_meme_model::saved::SavedMeme;

use crate::kv::KeyValueStore;

/// Storage key of the saved-meme array.
pub const STORAGE_KEY: &str = "saved-memes-v1";

/// Saved memes backed by a [`KeyValueStore`].
pub struct MemeLibrary<S: KeyValueStore> {
    store: S,
    cache: Option<Vec<SavedMeme>>,
}

impl<S: KeyValueStore> MemeLibrary<S> {
    /// Take ownership of `store`. Nothing is read until first access.
    pub fn open(store: S) -> Self {
        tracing::debug!(store = store.name(), "Opened meme library");
        Self { store, cache: None }
    }

    /// Drop the cache and hand back the store.
    pub fn close(self) -> S {
        tracing::debug!(store = self.store.name(), "Closed meme library");
        self.store
    }

    /// All saved memes, newest first.
    pub fn get_all(&mut self) -> &[SavedMeme] {
        if self.cache.is_none() {
            self.cache = Some(self.read());
        }
        self.cache.as_deref().unwrap_or_default()
    }

    /// Insert at the head. Returns `false` when the id is already present.
    pub fn save(&mut self, meme: SavedMeme) -> bool {
        if self.get_all().iter().any(|m| m.id == meme.id) {
            tracing::debug!(id = %meme.id, "Meme already saved");
            return false;
        }
        let mut memes = self.get_all().to_vec();
        let id = meme.id.clone();
        memes.insert(0, meme);
        self.write(&memes);
        self.cache = Some(memes);
        tracing::info!(%id, "Saved meme");
        true
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.get_all().len();
        let memes: Vec<SavedMeme> = self
            .get_all()
            .iter()
            .filter(|m| m.id != id)
            .cloned()
            .collect();
        if memes.len() == before {
            tracing::debug!(id, "No saved meme to delete");
            return false;
        }
        self.write(&memes);
        self.cache = Some(memes);
        tracing::info!(id, "Deleted meme");
        true
    }

    pub fn clear(&mut self) {
        self.write(&[]);
        self.cache = Some(Vec::new());
        tracing::info!("Cleared meme library");
    }

    /// Forget the in-memory copy so the next access re-reads storage.
    pub fn refresh(&mut self) {
        self.cache = None;
    }

    pub fn count(&mut self) -> usize {
        self.get_all().len()
    }

    pub fn get(&mut self, id: &str) -> Option<&SavedMeme> {
        self.get_all().iter().find(|m| m.id == id)
    }

    fn read(&self) -> Vec<SavedMeme> {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(store = self.store.name(), "Failed to read saved memes: {e}");
                return Vec::new();
            }
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(store = self.store.name(), "Saved memes are not a JSON array: {e}");
                return Vec::new();
            }
        };

        let total = entries.len();
        let memes: Vec<SavedMeme> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        if memes.len() != total {
            tracing::warn!(
                dropped = total - memes.len(),
                kept = memes.len(),
                "Dropped malformed saved memes"
            );
        }
        memes
    }

    fn write(&mut self, memes: &[SavedMeme]) {
        let json = match serde_json::to_string(memes) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize saved memes: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(STORAGE_KEY, &json) {
            tracing::warn!(store = self.store.name(), "Failed to persist saved memes: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{FileStore, MemoryStore};
    use chrono::{DateTime, Utc};
    use image::{Rgba, RgbaImage};
    use memeforge_common::error::{MemeError, MemeResult};
    use memeforge_meme_model::raster::FlattenedImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        fn get(&self, _key: &str) -> MemeResult<Option<String>> {
            Err(MemeError::storage("unavailable"))
        }

        fn set(&mut self, _key: &str, _value: &str) -> MemeResult<()> {
            Err(MemeError::storage("quota exceeded"))
        }

        fn remove(&mut self, _key: &str) -> MemeResult<()> {
            Err(MemeError::storage("unavailable"))
        }
    }

    /// A memory store that stays reachable after the library takes it,
    /// and counts writes.
    #[derive(Clone, Default)]
    struct SharedStore {
        inner: Arc<Mutex<MemoryStore>>,
        writes: Arc<AtomicUsize>,
    }

    impl SharedStore {
        fn put(&self, value: &str) {
            self.inner.lock().unwrap().set(STORAGE_KEY, value).unwrap();
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl KeyValueStore for SharedStore {
        fn name(&self) -> &str {
            "shared"
        }

        fn get(&self, key: &str) -> MemeResult<Option<String>> {
            self.inner.lock().unwrap().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> MemeResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.lock().unwrap().set(key, value)
        }

        fn remove(&mut self, key: &str) -> MemeResult<()> {
            self.inner.lock().unwrap().remove(key)
        }
    }

    fn meme(shade: u8, millis: i64) -> SavedMeme {
        let flat = FlattenedImage::from_canvas(RgbaImage::from_pixel(2, 2, Rgba([shade, 0, 0, 255])));
        let at: DateTime<Utc> = DateTime::from_timestamp_millis(millis).unwrap();
        SavedMeme::from_flattened(&flat, format!("caption {shade}"), at).unwrap()
    }

    #[test]
    fn test_save_then_get_all_contains_one_entry() {
        let mut library = MemeLibrary::open(MemoryStore::new());
        let m = meme(1, 1_000);

        assert!(library.save(m.clone()));
        assert!(!library.save(m.clone()));

        let matching = library.get_all().iter().filter(|x| x.id == m.id).count();
        assert_eq!(matching, 1);
        assert_eq!(library.count(), 1);

        assert!(library.delete(&m.id));
        assert!(!library.delete(&m.id));
        assert_eq!(library.count(), 0);
    }

    #[test]
    fn test_newest_first() {
        let mut library = MemeLibrary::open(MemoryStore::new());
        let older = meme(1, 1_000);
        let newer = meme(2, 2_000);
        library.save(older.clone());
        library.save(newer.clone());
        let ids: Vec<&str> = library.get_all().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
        assert_eq!(library.get(&older.id), Some(&older));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let m = meme(3, 3_000);

        let mut library = MemeLibrary::open(FileStore::new(dir.path()));
        library.save(m.clone());
        let store = library.close();

        let mut reopened = MemeLibrary::open(store);
        assert_eq!(reopened.get_all(), &[m]);
    }

    #[test]
    fn test_lazy_load_drops_malformed_entries() {
        let good = meme(4, 4_000);
        let raw = serde_json::json!([
            serde_json::to_value(&good).unwrap(),
            {"id": 7, "url": "nope"},
            "garbage",
        ]);
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, &raw.to_string()).unwrap();

        let mut library = MemeLibrary::open(store);
        assert_eq!(library.get_all(), &[good]);
    }

    #[test]
    fn test_unparseable_storage_reads_as_empty() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{not json").unwrap();
        let mut library = MemeLibrary::open(store);
        assert_eq!(library.count(), 0);
    }

    #[test]
    fn test_refresh_rereads_storage() {
        let store = SharedStore::default();
        let mut library = MemeLibrary::open(store.clone());
        let kept = meme(5, 5_000);
        library.save(kept.clone());
        library.save(meme(6, 6_000));
        assert_eq!(library.count(), 2);

        // Another writer replaces the stored list behind the library's back.
        store.put(&serde_json::to_string(&[&kept]).unwrap());
        assert_eq!(library.count(), 2);

        library.refresh();
        assert_eq!(library.get_all(), &[kept]);
    }

    #[test]
    fn test_deleting_unknown_id_does_not_write() {
        let store = SharedStore::default();
        let mut library = MemeLibrary::open(store.clone());
        let m = meme(9, 9_000);
        library.save(m.clone());
        assert_eq!(store.writes(), 1);

        assert!(!library.delete("missing"));
        assert_eq!(store.writes(), 1);

        assert!(library.delete(&m.id));
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_clear_empties_cache_and_storage() {
        let mut library = MemeLibrary::open(MemoryStore::new());
        library.save(meme(7, 7_000));
        library.clear();
        assert_eq!(library.count(), 0);

        let store = library.close();
        assert_eq!(store.get(STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_failing_store_is_not_fatal() {
        let mut library = MemeLibrary::open(FailingStore);
        let m = meme(8, 8_000);
        assert_eq!(library.count(), 0);
        assert!(library.save(m.clone()));
        assert_eq!(library.get(&m.id), Some(&m));
        assert!(library.delete(&m.id));
        library.clear();
        assert_eq!(library.count(), 0);
    }
}
