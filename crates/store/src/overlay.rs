//! Shadow store: buffered writes over a parent [`KvStore`].

use std::collections::BTreeMap;

use crate::KvStore;

/// A speculative overlay over a parent store.
///
/// Writes and deletes are buffered in memory; the parent is untouched until
/// [`Overlay::commit`] replays the buffer onto it as the single, final step.
/// Discarding is simply dropping the overlay. Reads see the parent's state
/// plus this overlay's pending writes, so multi-step settlement logic
/// observes its own effects mid-pass.
///
/// `None` in the write buffer is a tombstone: the key is deleted as far as
/// readers of this overlay are concerned, whatever the parent holds.
pub struct Overlay<'p> {
    parent: &'p mut dyn KvStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'p> Overlay<'p> {
    /// Opens an overlay over `parent`.
    pub fn new(parent: &'p mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and tombstones.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Replays every buffered write onto the parent, consuming the overlay.
    ///
    /// Replay runs in key order, which keeps the parent's mutation sequence
    /// deterministic for write-tracking backends.
    pub fn commit(self) {
        for (key, entry) in self.writes {
            match entry {
                Some(value) => self.parent.set(key, value),
                None => self.parent.delete(&key),
            }
        }
    }
}

impl KvStore for Overlay<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(entry) => entry.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        // Merge the parent's matching entries with the buffered ones. Both
        // sources are key-sorted; buffered entries win on collision and
        // tombstones suppress parent entries.
        let parent_entries = self.parent.prefix_scan(prefix);
        let buffered: Vec<(&Vec<u8>, &Option<Vec<u8>>)> = self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .collect();

        let mut merged = Vec::with_capacity(parent_entries.len() + buffered.len());
        let mut parent_iter = parent_entries.into_iter().peekable();
        let mut buffer_iter = buffered.into_iter().peekable();

        loop {
            let order = match (parent_iter.peek(), buffer_iter.peek()) {
                (Some((pk, _)), Some((bk, _))) => pk.cmp(*bk),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => break,
            };
            match order {
                std::cmp::Ordering::Less => {
                    if let Some((k, v)) = parent_iter.next() {
                        merged.push((k, v));
                    }
                }
                std::cmp::Ordering::Greater | std::cmp::Ordering::Equal => {
                    if order == std::cmp::Ordering::Equal {
                        parent_iter.next();
                    }
                    if let Some((k, entry)) = buffer_iter.next() {
                        if let Some(value) = entry {
                            merged.push((k.clone(), value.clone()));
                        }
                    }
                }
            }
        }
        merged
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::MemStore;

    fn seeded() -> MemStore {
        let mut store = MemStore::new();
        store.set(b"k/a".to_vec(), b"1".to_vec());
        store.set(b"k/b".to_vec(), b"2".to_vec());
        store.set(b"other".to_vec(), b"x".to_vec());
        store
    }

    #[test]
    fn test_reads_pass_through_to_parent() {
        let mut store = seeded();
        let overlay = Overlay::new(&mut store);
        assert_eq!(overlay.get(b"k/a"), Some(b"1".to_vec()));
        assert_eq!(overlay.get(b"missing"), None);
    }

    #[test]
    fn test_writes_are_invisible_until_commit() {
        let mut store = seeded();
        {
            let mut overlay = Overlay::new(&mut store);
            overlay.set(b"k/c".to_vec(), b"3".to_vec());
            overlay.delete(b"k/a");
            // The overlay sees its own effects...
            assert_eq!(overlay.get(b"k/c"), Some(b"3".to_vec()));
            assert_eq!(overlay.get(b"k/a"), None);
            // ...and is dropped without commit.
        }
        assert_eq!(store.get(b"k/c"), None, "uncommitted write escaped");
        assert_eq!(store.get(b"k/a"), Some(b"1".to_vec()), "uncommitted delete escaped");
    }

    #[test]
    fn test_commit_replays_buffer() {
        let mut store = seeded();
        let mut overlay = Overlay::new(&mut store);
        overlay.set(b"k/c".to_vec(), b"3".to_vec());
        overlay.set(b"k/a".to_vec(), b"updated".to_vec());
        overlay.delete(b"k/b");
        overlay.commit();

        assert_eq!(store.get(b"k/a"), Some(b"updated".to_vec()));
        assert_eq!(store.get(b"k/b"), None);
        assert_eq!(store.get(b"k/c"), Some(b"3".to_vec()));
    }

    #[test]
    fn test_prefix_scan_merges_sources() {
        let mut store = seeded();
        let mut overlay = Overlay::new(&mut store);
        overlay.set(b"k/c".to_vec(), b"3".to_vec());
        overlay.set(b"k/b".to_vec(), b"2b".to_vec());
        overlay.delete(b"k/a");

        let scanned = overlay.prefix_scan(b"k/");
        assert_eq!(
            scanned,
            vec![
                (b"k/b".to_vec(), b"2b".to_vec()),
                (b"k/c".to_vec(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn test_prefix_scan_matches_committed_state() {
        // The overlay's view must equal what the parent holds after commit.
        let mut store = seeded();
        let mut overlay = Overlay::new(&mut store);
        overlay.set(b"k/0".to_vec(), b"first".to_vec());
        overlay.delete(b"k/b");
        let viewed = overlay.prefix_scan(b"k/");
        overlay.commit();
        assert_eq!(viewed, store.prefix_scan(b"k/"));
    }

    #[test]
    fn test_nested_overlays() {
        let mut store = seeded();
        let mut outer = Overlay::new(&mut store);
        outer.set(b"k/outer".to_vec(), b"o".to_vec());
        {
            let mut inner = Overlay::new(&mut outer);
            inner.set(b"k/inner".to_vec(), b"i".to_vec());
            assert_eq!(inner.get(b"k/outer"), Some(b"o".to_vec()));
            inner.commit();
        }
        assert_eq!(outer.get(b"k/inner"), Some(b"i".to_vec()));
        // Nothing reached the root store yet.
        outer.commit();
        assert_eq!(store.get(b"k/inner"), Some(b"i".to_vec()));
    }
}
