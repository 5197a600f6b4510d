//! # ftx-feed
//!
//! Local order-book reconstruction for an FTX-style streaming market-data
//! feed.
//!
//! ## Features
//!
//! - **Incremental merge** - snapshots replace, deltas upsert, size `0`
//!   removes; bids and asks stay sorted per side
//! - **Checksum verification** - every message is checked against the
//!   exchange's CRC-32 over the canonical top-100 book string
//! - **Automatic resync** - a mismatch clears the market and replays the
//!   orderbook subscription until a fresh snapshot lands
//! - **Async/Await** - built on Tokio; readers can block for freshness
//!   with per-market edge-triggered wakeups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ftx_feed::{Config, FeedClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ftx_feed::Error> {
//!     let config = Config::new();
//!     let mut client = FeedClient::connect(config).await?;
//!     client.subscribe_order_book("BTC-PERP").await?;
//!
//!     // Readers can hold the engine handle from any task.
//!     let engine = client.engine();
//!     tokio::spawn(async move {
//!         engine.wait_for_update("BTC-PERP", None).await;
//!         let book = engine.order_book("BTC-PERP");
//!         println!("best bid: {:?}", book.bids.first());
//!     });
//!
//!     client.run().await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`orderbook`] - the reconstruction core: store, checksum, engine,
//!   notifier
//! - [`client`] - websocket transport and login signing
//! - [`types`] - wire protocol and primitive types
//! - [`config`] - endpoint and credential configuration
//! - [`error`] - error types for the crate
//!
//! The transport delivers one parsed message at a time to the engine, so
//! every message's levels land atomically with respect to readers. Resync
//! subscription requests flow back from the engine over a channel and are
//! drained onto the socket by [`FeedClient::run`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use client::WebSocketClient;
use orderbook::{BookSnapshot, OrderBookEngine};
use types::messages::{Channel, WsCommand, WsMessage};
use types::Timestamp;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// The main feed client: websocket transport wired to the book engine.
///
/// Owns the single ingestion task's state. Point-in-time reads and
/// freshness waits go through the shared [`OrderBookEngine`] handle from
/// any task; message processing happens wherever [`FeedClient::run`] (or
/// [`FeedClient::process_next`]) is driven.
#[derive(Debug)]
pub struct FeedClient {
    ws: WebSocketClient,
    engine: Arc<OrderBookEngine>,
    subscription_rx: mpsc::UnboundedReceiver<WsCommand>,
    config: Config,
}

impl FeedClient {
    /// Connect to the configured endpoint.
    ///
    /// Logs in automatically when the config carries credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the websocket connection or login send fails.
    pub async fn connect(config: Config) -> Result<Self> {
        let mut ws = WebSocketClient::connect(&config).await?;
        if config.has_credentials() {
            ws.login(&config).await?;
        }
        let (engine, subscription_rx) = OrderBookEngine::new();
        Ok(Self {
            ws,
            engine: Arc::new(engine),
            subscription_rx,
            config,
        })
    }

    /// Shared handle to the book engine for reads from other tasks
    pub fn engine(&self) -> Arc<OrderBookEngine> {
        Arc::clone(&self.engine)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to the order book feed for `market`
    pub async fn subscribe_order_book(&mut self, market: &str) -> Result<()> {
        self.engine.track(market);
        self.ws.subscribe(Channel::Orderbook, Some(market)).await?;
        Ok(())
    }

    /// Subscribe to trade prints for `market`
    pub async fn subscribe_trades(&mut self, market: &str) -> Result<()> {
        self.ws.subscribe(Channel::Trades, Some(market)).await?;
        Ok(())
    }

    /// Subscribe to the ticker for `market`
    pub async fn subscribe_ticker(&mut self, market: &str) -> Result<()> {
        self.ws.subscribe(Channel::Ticker, Some(market)).await?;
        Ok(())
    }

    /// Sorted point-in-time copy of one market's book
    #[must_use]
    pub fn order_book(&self, market: &str) -> BookSnapshot {
        self.engine.order_book(market)
    }

    /// Server time of the last applied message, `None` if never updated
    #[must_use]
    pub fn order_book_timestamp(&self, market: &str) -> Option<Timestamp> {
        self.engine.timestamp(market)
    }

    /// Snapshot of the book, waiting for the first verified image when no
    /// message has arrived yet.
    ///
    /// Waits up to the config's `wait_timeout`; on timeout the snapshot is
    /// returned as-is (possibly empty). The feed must be driven for the
    /// image to arrive, so call this through the shared engine handle
    /// from another task, or interleave it with
    /// [`FeedClient::process_next`].
    pub async fn order_book_fresh(&self, market: &str) -> BookSnapshot {
        self.engine
            .order_book_fresh(market, self.config.wait_timeout())
            .await
    }

    /// Block until the next verified book update for `market`.
    ///
    /// `None` waits indefinitely. Returns `false` on timeout, which is a
    /// normal return; check the timestamp to tell whether data has ever
    /// arrived.
    pub async fn wait_for_update(&self, market: &str, timeout: Option<Duration>) -> bool {
        self.engine.wait_for_update(market, timeout).await
    }

    /// Receive and process one message.
    ///
    /// Order book frames are applied to the engine; any resync requests
    /// the engine issued are flushed to the socket before the message is
    /// handed back. Non-orderbook frames (trades, ticker, acks) pass
    /// through untouched for the caller to consume.
    ///
    /// # Returns
    ///
    /// The message, or `None` if the connection is closed.
    pub async fn process_next(&mut self) -> Option<Result<WsMessage>> {
        let msg = match self.ws.next().await? {
            Ok(msg) => msg,
            Err(e) => return Some(Err(e)),
        };

        if let WsMessage::Data(frame) = &msg {
            if let Err(e) = self.engine.handle_message(frame) {
                return Some(Err(e));
            }
            if let Err(e) = self.flush_subscription_requests().await {
                return Some(Err(e));
            }
        }

        Some(Ok(msg))
    }

    /// Drive the feed until the connection closes or a fatal error.
    ///
    /// [`Error::Reconnect`] propagates out; reconnect policy belongs to
    /// the caller, which can call [`OrderBookEngine::reset_all`] and
    /// connect a fresh client.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(msg) = self.process_next().await {
            msg?;
        }
        Err(Error::ConnectionClosed)
    }

    /// Forward engine-issued subscription requests to the socket
    async fn flush_subscription_requests(&mut self) -> Result<()> {
        while let Ok(cmd) = self.subscription_rx.try_recv() {
            self.ws.forward(cmd).await?;
        }
        Ok(())
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.ws.close().await
    }
}
