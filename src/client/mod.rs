//! Transport clients for the exchange websocket.
//!
//! This module contains:
//!
//! - [`websocket`] - WebSocket client with subscription tracking
//! - [`auth`] - HMAC-SHA256 login signing

pub mod auth;
pub mod websocket;

pub use auth::Signer;
pub use websocket::WebSocketClient;
