//! Core order book data structure.
//!
//! This implementation uses `BTreeMap` for sorted price levels, providing:
//!
//! - O(log n) insertion, deletion, and lookup
//! - O(1) access to best bid/ask (via `first_key_value` / `last_key_value`)
//! - Ordered iteration for depth-of-book queries and checksum truncation

use std::collections::BTreeMap;

use crate::types::{Price, Size};

/// Side of the book a level belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side, best price is the highest
    Bid,
    /// Sell side, best price is the lowest
    Ask,
}

/// Sorted point-in-time copy of one market's book.
///
/// Bids are ordered by descending price, asks by ascending price; neither
/// side contains a zero-size level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSnapshot {
    /// Bid levels, best (highest) first
    pub bids: Vec<(f64, f64)>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<(f64, f64)>,
}

/// Order book for a single market.
///
/// # Design
///
/// 1. **Float prices under a total order**: the exchange quotes prices as
///    JSON floats, so levels are keyed by [`Price`], which wraps `f64`
///    with `total_cmp`. Equality is bit-exact, matching the exchange's own
///    keying of levels.
///
/// 2. **BTreeMap per side**: sorted price levels with O(log n) updates and
///    cheap in-order iteration for the top-100 checksum window.
///
/// 3. **Zero means absent**: an upsert with size `0` removes the level;
///    no zero-size level is ever stored.
///
/// # Thread Safety
///
/// This struct is `Send + Sync` but not internally synchronized; the store
/// wraps it in a per-market `parking_lot::RwLock`.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Bid levels: price -> size, sorted ascending (best bid = last)
    bids: BTreeMap<Price, Size>,
    /// Ask levels: price -> size, sorted ascending (best ask = first)
    asks: BTreeMap<Price, Size>,
}

impl OrderBook {
    /// Create a new empty order book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replace, or remove the level at `price`.
    ///
    /// A size greater than zero inserts or replaces; a size of exactly
    /// zero removes the level (no-op when absent). Callers must have
    /// validated that price and size are finite and non-negative; the
    /// engine rejects anything else before it reaches the book.
    pub fn upsert(&mut self, side: Side, price: Price, size: Size) {
        debug_assert!(price.value().is_finite() && price.value() >= 0.0);
        debug_assert!(size.is_finite() && size >= 0.0);

        let levels = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };

        if size == 0.0 {
            levels.remove(&price);
        } else {
            levels.insert(price, size);
        }
    }

    /// Get the best bid as `(price, size)`, or `None` if no bids
    #[must_use]
    pub fn best_bid(&self) -> Option<(f64, f64)> {
        self.bids.last_key_value().map(|(&p, &s)| (p.value(), s))
    }

    /// Get the best ask as `(price, size)`, or `None` if no asks
    #[must_use]
    pub fn best_ask(&self) -> Option<(f64, f64)> {
        self.asks.first_key_value().map(|(&p, &s)| (p.value(), s))
    }

    /// All bid levels, sorted by price descending (best first)
    pub fn bids(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bids.iter().rev().map(|(&p, &s)| (p.value(), s))
    }

    /// All ask levels, sorted by price ascending (best first)
    pub fn asks(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.asks.iter().map(|(&p, &s)| (p.value(), s))
    }

    /// Materialize a sorted snapshot of both sides
    #[must_use]
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids().collect(),
            asks: self.asks().collect(),
        }
    }

    /// Remove every level from both sides
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Check if both sides are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get the number of price levels as `(bids, asks)`
    #[must_use]
    pub fn num_levels(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}
