//! Core types for the feed engine.
//!
//! This module contains the primitive types shared across the crate:
//!
//! - [`Price`] - a total-ordered wrapper over the exchange's `f64` prices
//! - [`Size`] - level quantity
//! - [`Timestamp`] - server-supplied update time
//! - [`messages`] - websocket wire protocol types

pub mod messages;

pub use messages::{Channel, OrderBookData, WsCommand, WsMessage};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Level quantity as sent by the exchange
///
/// A size of exactly `0.0` on the wire means "remove this level"; the book
/// never stores it.
pub type Size = f64;

/// Server-supplied update time, seconds since the Unix epoch
///
/// Monotonically non-decreasing under correct operation, but the engine
/// stores whatever the server sent without checking.
pub type Timestamp = f64;

/// Price of a book level.
///
/// FTX quotes prices as JSON floats, so the natural key type is `f64` -
/// which is not `Ord` and cannot key a `BTreeMap` directly. `Price` wraps
/// it with the total order from [`f64::total_cmp`]. The engine rejects
/// non-finite and negative values before a `Price` ever reaches the book,
/// so the NaN corner of the total order is never exercised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub f64);

impl Price {
    /// The raw float value
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
