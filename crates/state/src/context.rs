//! Per-transition execution context.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use tideflow_store::{KvStore, Overlay};
use tideflow_types::{decode, encode, Event, Result};

/// Execution context for one state transition.
///
/// Carries the block time and height the surrounding runtime materialized,
/// an append-only event log, and exclusive access to the ledger store for
/// the duration of the transition. Never held across transitions.
pub struct Context<'a> {
    store: &'a mut dyn KvStore,
    height: u64,
    time: DateTime<Utc>,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    /// Creates a context over `store` at the given block position.
    pub fn new(store: &'a mut dyn KvStore, height: u64, time: DateTime<Utc>) -> Self {
        Self {
            store,
            height,
            time,
            events: Vec::new(),
        }
    }

    /// Current block height.
    #[inline]
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Current block time.
    #[inline]
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Raw read.
    pub fn get_raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.store.get(key)
    }

    /// Raw write.
    pub fn set_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.store.set(key, value);
    }

    /// Raw delete.
    pub fn delete_raw(&mut self, key: &[u8]) {
        self.store.delete(key);
    }

    /// Lexicographic prefix scan over the store.
    pub fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.store.prefix_scan(prefix)
    }

    /// Reads and decodes a record.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the stored bytes do not decode as `T`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.store.get(key) {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes a record.
    ///
    /// # Errors
    ///
    /// Returns a codec error if `value` fails to serialize.
    pub fn set_value<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<()> {
        let bytes = encode(value)?;
        self.store.set(key, bytes);
        Ok(())
    }

    /// Appends an event to the transition's event log.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events emitted so far in this transition.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drains the event log, leaving it empty.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Runs `f` against a shadow of this context.
    ///
    /// The closure sees a context whose store is an [`Overlay`]: reads
    /// observe committed state plus the shadow's own pending writes, and
    /// events buffer separately. On `Ok` the buffered writes replay onto the
    /// parent store and the buffered events append to the parent log; the
    /// commit is the final operation. On `Err` everything is discarded and
    /// the error is returned; the parent context is untouched either way
    /// until commit.
    pub fn with_shadow<R>(
        &mut self,
        f: impl FnOnce(&mut Context<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut overlay = Overlay::new(&mut *self.store);
        let mut shadow = Context {
            store: &mut overlay,
            height: self.height,
            time: self.time,
            events: Vec::new(),
        };
        match f(&mut shadow) {
            Ok(result) => {
                let events = std::mem::take(&mut shadow.events);
                drop(shadow);
                overlay.commit();
                self.events.extend(events);
                Ok(result)
            }
            Err(err) => Err(err),
        }
    }
}
