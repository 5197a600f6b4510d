//! WebSocket wire protocol types.
//!
//! This module contains types for commands sent to the exchange and
//! messages received from it. FTX frames every outbound command as
//! `{"op": ...}` and every inbound message as `{"type": ...}` with the
//! channel payload nested under `data`.

use serde::{Deserialize, Serialize};

/// A feed channel the client can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Incremental order book deltas plus periodic full snapshots
    Orderbook,
    /// Public trade prints
    Trades,
    /// Best bid/offer ticker
    Ticker,
}

/// Command sent to the websocket server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum WsCommand {
    /// Subscribe to a channel, optionally scoped to one market
    Subscribe {
        /// Channel to subscribe to
        channel: Channel,
        /// Market name (omitted for market-wide channels)
        #[serde(skip_serializing_if = "Option::is_none")]
        market: Option<String>,
    },
    /// Unsubscribe from a channel
    Unsubscribe {
        /// Channel to unsubscribe from
        channel: Channel,
        /// Market name
        #[serde(skip_serializing_if = "Option::is_none")]
        market: Option<String>,
    },
    /// Authenticate the connection
    Login {
        /// Signed login arguments
        args: LoginArgs,
    },
    /// Keepalive ping
    Ping,
}

impl WsCommand {
    /// Build a subscribe command for `(channel, market)`
    pub fn subscribe(channel: Channel, market: impl Into<String>) -> Self {
        Self::Subscribe {
            channel,
            market: Some(market.into()),
        }
    }

    /// Build an unsubscribe command for `(channel, market)`
    pub fn unsubscribe(channel: Channel, market: impl Into<String>) -> Self {
        Self::Unsubscribe {
            channel,
            market: Some(market.into()),
        }
    }
}

/// Arguments for the `login` op
///
/// `sign` is the hex HMAC-SHA256 of `"{time}websocket_login"` keyed by the
/// API secret; see [`crate::client::auth::Signer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginArgs {
    /// API key
    pub key: String,
    /// Hex-encoded request signature
    pub sign: String,
    /// Signing timestamp in milliseconds
    pub time: u64,
}

/// Message received from the websocket server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsMessage {
    /// Subscription confirmed
    Subscribed(SubscriptionAck),
    /// Unsubscription confirmed
    Unsubscribed(SubscriptionAck),
    /// Server informational notice (code 20001 = please reconnect)
    Info(InfoMsg),
    /// Error response
    Error(ErrorMsg),
    /// Keepalive reply
    Pong,
    /// Channel data frame. FTX tags full snapshots `partial` and
    /// incremental messages `update`; the payload under `data` is
    /// channel-specific, so it stays raw until dispatch.
    #[serde(rename = "update", alias = "partial")]
    Data(DataMsg),
}

/// Acknowledgement of a subscribe/unsubscribe command
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionAck {
    /// Channel the acknowledgement is for
    pub channel: Channel,
    /// Market, when the subscription was market-scoped
    pub market: Option<String>,
}

/// Server informational notice
#[derive(Debug, Clone, Deserialize)]
pub struct InfoMsg {
    /// Notice code
    pub code: i64,
    /// Human-readable detail
    pub msg: Option<String>,
}

/// Code the server sends when it wants the client to reconnect
pub const INFO_CODE_RECONNECT: i64 = 20001;

/// Error sent by the server
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMsg {
    /// Error code (not always present)
    pub code: Option<i64>,
    /// Error message
    pub msg: String,
}

/// A channel data frame
#[derive(Debug, Clone, Deserialize)]
pub struct DataMsg {
    /// Channel that produced this frame
    pub channel: Channel,
    /// Market the frame applies to
    pub market: Option<String>,
    /// Channel-specific payload
    pub data: serde_json::Value,
}

impl DataMsg {
    /// Decode the payload as an order book snapshot-or-delta
    pub fn order_book(&self) -> Result<OrderBookData, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Decode the payload as a batch of trade prints
    pub fn trades(&self) -> Result<Vec<TradeData>, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Whether an order book message replaces or amends the local book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookAction {
    /// Full image: the local book must be cleared before applying levels
    #[serde(alias = "partial")]
    Snapshot,
    /// Incremental delta against the current book
    Update,
}

/// Order book payload carried by `orderbook` channel frames
///
/// Levels are `[price, size]` pairs. A size of `0` removes the level.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBookData {
    /// Snapshot or incremental update
    pub action: BookAction,
    /// Server time of this image, seconds since epoch
    pub time: f64,
    /// CRC-32 over the canonical top-100 book string
    pub checksum: u32,
    /// Bid levels as `[price, size]`
    pub bids: Vec<[f64; 2]>,
    /// Ask levels as `[price, size]`
    pub asks: Vec<[f64; 2]>,
}

/// A single trade print from the `trades` channel
#[derive(Debug, Clone, Deserialize)]
pub struct TradeData {
    /// Trade ID
    pub id: Option<u64>,
    /// Execution price
    pub price: f64,
    /// Executed size
    pub size: f64,
    /// Taker side, `"buy"` or `"sell"`
    pub side: String,
    /// Whether the trade was a liquidation
    #[serde(default)]
    pub liquidation: bool,
    /// Exchange timestamp, RFC 3339
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_command_serialization() {
        let cmd = WsCommand::subscribe(Channel::Orderbook, "BTC-PERP");
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""op":"subscribe""#));
        assert!(json.contains(r#""channel":"orderbook""#));
        assert!(json.contains(r#""market":"BTC-PERP""#));
    }

    #[test]
    fn test_login_serialization() {
        let cmd = WsCommand::Login {
            args: LoginArgs {
                key: "k".into(),
                sign: "abc123".into(),
                time: 1656364800000,
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""op":"login""#));
        assert!(json.contains(r#""sign":"abc123""#));
    }

    #[test]
    fn test_partial_deserializes_as_data() {
        let json = r#"{
            "type": "partial",
            "channel": "orderbook",
            "market": "BTC-PERP",
            "data": {
                "action": "partial",
                "time": 1656364800.123,
                "checksum": 123456789,
                "bids": [[20000.0, 1.5]],
                "asks": [[20001.0, 2.0]]
            }
        }"#;

        let msg: WsMessage = serde_json::from_str(json).unwrap();
        match msg {
            WsMessage::Data(data) => {
                assert_eq!(data.channel, Channel::Orderbook);
                assert_eq!(data.market.as_deref(), Some("BTC-PERP"));
                let book = data.order_book().unwrap();
                assert_eq!(book.action, BookAction::Snapshot);
                assert_eq!(book.checksum, 123456789);
                assert_eq!(book.bids, vec![[20000.0, 1.5]]);
            }
            other => panic!("expected Data, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_action_spelling() {
        // Both the FTX spelling and the plain one decode to Snapshot.
        let a: BookAction = serde_json::from_str(r#""partial""#).unwrap();
        let b: BookAction = serde_json::from_str(r#""snapshot""#).unwrap();
        assert_eq!(a, BookAction::Snapshot);
        assert_eq!(b, BookAction::Snapshot);
    }

    #[test]
    fn test_info_reconnect_code() {
        let json = r#"{"type": "info", "code": 20001, "msg": "scheduled restart"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        match msg {
            WsMessage::Info(info) => assert_eq!(info.code, INFO_CODE_RECONNECT),
            other => panic!("expected Info, got {other:?}"),
        }
    }
}
