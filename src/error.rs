//! Error types for the ftx-feed crate.
//!
//! This module defines the errors that can occur while maintaining the
//! local book: transport failures, protocol violations, and contract
//! violations in delta payloads. A checksum mismatch is deliberately not
//! an error - it is handled internally by the resync path and never
//! surfaced to readers.

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration (missing fields, bad format)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server sent an error frame
    #[error("Server error{}: {msg}", .code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Server {
        /// Error code, when the server supplied one
        code: Option<i64>,
        /// Error message
        msg: String,
    },

    /// Server asked the client to reconnect (info code 20001)
    #[error("Server requested reconnect")]
    Reconnect,

    /// A delta carried a negative or non-finite price/size. The message is
    /// abandoned rather than applied; the book keeps its previous state.
    #[error("Invalid level for {market}: price {price}, size {size}")]
    InvalidLevel {
        /// Market the bad level was destined for
        market: String,
        /// Offending price
        price: f64,
        /// Offending size
        size: f64,
    },

    /// An order book frame arrived without a market name
    #[error("Order book frame missing market")]
    MissingMarket,

    /// The engine's subscription request channel is closed
    #[error("Subscription channel closed")]
    SubscriptionChannelClosed,

    /// WebSocket connection closed unexpectedly
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}
