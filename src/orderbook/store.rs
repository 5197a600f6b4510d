//! Per-market book storage.
//!
//! [`OrderBookStore`] owns every [`OrderBook`] plus its last-applied server
//! timestamp, keyed by market name. Nothing else in the crate retains a
//! book across calls; readers get sorted copies.
//!
//! # Locking
//!
//! Two levels of `parking_lot::RwLock`: an outer lock on the market map and
//! an inner lock per market entry. The single ingestion task holds one
//! entry's write lock for the duration of a message, which is what makes a
//! multi-level delta atomic with respect to readers. Contention on one
//! market never blocks reads of another.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::types::{Price, Size, Timestamp};

use super::book::{BookSnapshot, OrderBook, Side};

/// One market's book plus its last-applied server time
#[derive(Debug, Default)]
struct BookEntry {
    book: OrderBook,
    /// `None` until the first message for this market is applied
    timestamp: Option<Timestamp>,
}

/// Store of all per-market order books.
///
/// Markets are created explicitly via [`OrderBookStore::get_or_create`],
/// never as a side effect of a read: looking up a market that was never
/// subscribed returns an empty snapshot and no timestamp without
/// materializing an entry.
#[derive(Debug, Default)]
pub struct OrderBookStore {
    books: RwLock<FxHashMap<String, RwLock<BookEntry>>>,
}

impl OrderBookStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an entry exists for `market`, creating an empty one if needed
    pub fn get_or_create(&self, market: &str) {
        let mut books = self.books.write();
        books
            .entry(market.to_string())
            .or_insert_with(|| RwLock::new(BookEntry::default()));
    }

    /// Insert, replace, or remove a single level.
    ///
    /// Size `0` removes. The market entry must already exist (see
    /// [`OrderBookStore::get_or_create`]); the call is a no-op otherwise.
    pub fn upsert(&self, market: &str, side: Side, price: Price, size: Size) {
        let books = self.books.read();
        if let Some(entry) = books.get(market) {
            entry.write().book.upsert(side, price, size);
        }
    }

    /// Discard all levels and the timestamp for `market`.
    ///
    /// The entry itself stays; the next read sees an empty book and no
    /// timestamp. No-op for unknown markets.
    pub fn reset(&self, market: &str) {
        let books = self.books.read();
        if let Some(entry) = books.get(market) {
            let mut e = entry.write();
            e.book.clear();
            e.timestamp = None;
        }
    }

    /// Sorted snapshot of `market`: bids descending, asks ascending.
    ///
    /// Unknown markets return an empty snapshot.
    #[must_use]
    pub fn snapshot(&self, market: &str) -> BookSnapshot {
        let books = self.books.read();
        books
            .get(market)
            .map(|entry| entry.read().book.snapshot())
            .unwrap_or_default()
    }

    /// Last applied server timestamp, or `None` if never updated
    #[must_use]
    pub fn timestamp(&self, market: &str) -> Option<Timestamp> {
        let books = self.books.read();
        books.get(market).and_then(|entry| entry.read().timestamp)
    }

    /// Drop a market entirely
    pub fn remove(&self, market: &str) {
        self.books.write().remove(market);
    }

    /// All known market names
    pub fn markets(&self) -> Vec<String> {
        self.books.read().keys().cloned().collect()
    }

    /// Number of tracked markets
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    /// Check if the store tracks no markets
    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }

    /// Run `f` with exclusive access to one market's book and timestamp.
    ///
    /// This is the applier's hook: the whole closure runs under the entry
    /// write lock, so every level of one message lands atomically with
    /// respect to readers. Returns `None` if the market does not exist.
    pub(crate) fn with_entry<R>(
        &self,
        market: &str,
        f: impl FnOnce(&mut OrderBook, &mut Option<Timestamp>) -> R,
    ) -> Option<R> {
        let books = self.books.read();
        books.get(market).map(|entry| {
            let mut e = entry.write();
            let BookEntry { book, timestamp } = &mut *e;
            f(book, timestamp)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_market_reads() {
        let store = OrderBookStore::new();
        assert_eq!(store.snapshot("NOPE"), BookSnapshot::default());
        assert_eq!(store.timestamp("NOPE"), None);
        // Reads must not create entries.
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let store = OrderBookStore::new();
        store.get_or_create("BTC-PERP");
        store.upsert("BTC-PERP", Side::Bid, Price(100.0), 1.0);
        store.get_or_create("BTC-PERP");

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot("BTC-PERP").bids, vec![(100.0, 1.0)]);
    }

    #[test]
    fn test_reset_clears_levels_and_timestamp() {
        let store = OrderBookStore::new();
        store.get_or_create("BTC-PERP");
        store.upsert("BTC-PERP", Side::Bid, Price(100.0), 1.0);
        store.with_entry("BTC-PERP", |_, ts| *ts = Some(1000.0));

        store.reset("BTC-PERP");

        let snap = store.snapshot("BTC-PERP");
        assert!(snap.bids.is_empty() && snap.asks.is_empty());
        assert_eq!(store.timestamp("BTC-PERP"), None);
        // The entry survives a reset.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_with_entry_atomicity_surface() {
        let store = OrderBookStore::new();
        store.get_or_create("ETH-PERP");

        let applied = store.with_entry("ETH-PERP", |book, ts| {
            book.upsert(Side::Bid, Price(2000.0), 1.0);
            book.upsert(Side::Ask, Price(2001.0), 2.0);
            *ts = Some(42.0);
            book.num_levels()
        });

        assert_eq!(applied, Some((1, 1)));
        assert_eq!(store.timestamp("ETH-PERP"), Some(42.0));
        assert!(store.with_entry("MISSING", |_, _| ()).is_none());
    }
}
