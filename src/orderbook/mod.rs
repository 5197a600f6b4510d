//! Local order book reconstruction.
//!
//! This module is the core of the crate: it rebuilds each market's book
//! from the exchange's incremental feed and keeps it provably in sync.
//!
//! - [`book`] - single-market sorted price-level maps
//! - [`store`] - per-market ownership, timestamps, atomic message apply
//! - [`checksum`] - canonical top-100 string and CRC-32 comparison
//! - [`engine`] - delta application, resync coordination, notifications
//! - [`notify`] - per-market edge-triggered update signals
//!
//! # Example
//!
//! ```rust
//! use ftx_feed::orderbook::OrderBookEngine;
//!
//! let (engine, _subscription_requests) = OrderBookEngine::new();
//!
//! // In the transport receive loop: engine.handle_message(&frame)?;
//!
//! let book = engine.order_book("BTC-PERP");
//! if let Some(&(price, size)) = book.bids.first() {
//!     println!("best bid: {size} @ {price}");
//! }
//! ```

pub mod book;
pub mod checksum;
pub mod engine;
pub mod notify;
pub mod store;

pub use book::{BookSnapshot, OrderBook, Side};
pub use checksum::CHECKSUM_DEPTH;
pub use engine::OrderBookEngine;
pub use notify::UpdateNotifier;
pub use store::OrderBookStore;
