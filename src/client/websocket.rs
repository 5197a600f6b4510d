//! WebSocket client for the real-time market data feed.
//!
//! This module provides the [`WebSocketClient`] for streaming data:
//!
//! - Order book snapshots and deltas
//! - Trade prints
//! - Ticker updates
//!
//! The client tracks its own subscription set so that repeated subscribe
//! requests for the same `(channel, market)` pair are suppressed, and it
//! answers protocol pings automatically.
//!
//! # Example
//!
//! ```rust,no_run
//! use ftx_feed::client::websocket::WebSocketClient;
//! use ftx_feed::types::messages::Channel;
//! use ftx_feed::Config;
//!
//! # async fn example() -> Result<(), ftx_feed::Error> {
//! let config = Config::new();
//! let mut ws = WebSocketClient::connect(&config).await?;
//! ws.subscribe(Channel::Orderbook, Some("BTC-PERP")).await?;
//!
//! while let Some(msg) = ws.next().await {
//!     let msg = msg?;
//!     // dispatch
//! }
//! # Ok(())
//! # }
//! ```

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rustc_hash::FxHashSet;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use crate::client::auth::Signer;
use crate::config::Config;
use crate::error::Error;
use crate::types::messages::{Channel, WsCommand, WsMessage, INFO_CODE_RECONNECT};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A `(channel, market)` subscription key
type SubscriptionKey = (Channel, Option<String>);

/// WebSocket client for the market data feed.
///
/// # Thread Safety
///
/// This client is NOT thread-safe. Run it from a single task; fan messages
/// out through the engine or channels.
#[derive(Debug)]
pub struct WebSocketClient {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    /// Requested subscriptions, tracked on send so duplicates are
    /// suppressed before they reach the wire
    subscriptions: FxHashSet<SubscriptionKey>,
    logged_in: bool,
}

impl WebSocketClient {
    /// Connect to the configured websocket endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP/TLS connection or websocket handshake
    /// fails.
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let (ws_stream, _response) =
            tokio_tungstenite::connect_async(config.endpoint()).await?;
        let (write, read) = ws_stream.split();
        info!(endpoint = config.endpoint(), "websocket connected");

        Ok(Self {
            write,
            read,
            subscriptions: FxHashSet::default(),
            logged_in: false,
        })
    }

    /// Send a command to the server
    pub async fn send_command(&mut self, cmd: &WsCommand) -> Result<(), Error> {
        let json = serde_json::to_string(cmd)?;
        self.write.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Authenticate the session with the credentials in `config`.
    ///
    /// No-op if already logged in. Public channels do not need this.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if credentials are missing.
    pub async fn login(&mut self, config: &Config) -> Result<(), Error> {
        if self.logged_in {
            return Ok(());
        }
        let (key, secret) = config
            .api_key()
            .zip(config.api_secret())
            .ok_or_else(|| Error::Config("login requires api_key and api_secret".to_string()))?;

        let time = Signer::current_timestamp_ms();
        let args = Signer::new(secret).login_args(key, time);
        self.send_command(&WsCommand::Login { args }).await?;
        self.logged_in = true;
        info!("websocket login sent");
        Ok(())
    }

    /// Whether a login op has been sent on this connection
    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    /// Subscribe to `(channel, market)`, suppressing duplicates.
    ///
    /// Returns `true` if a request was actually sent, `false` if the
    /// subscription was already active.
    pub async fn subscribe(
        &mut self,
        channel: Channel,
        market: Option<&str>,
    ) -> Result<bool, Error> {
        let key = (channel, market.map(str::to_string));
        if self.subscriptions.contains(&key) {
            return Ok(false);
        }
        self.send_command(&WsCommand::Subscribe {
            channel,
            market: key.1.clone(),
        })
        .await?;
        info!(?channel, market, "subscribed");
        self.subscriptions.insert(key);
        Ok(true)
    }

    /// Unsubscribe from `(channel, market)`
    pub async fn unsubscribe(
        &mut self,
        channel: Channel,
        market: Option<&str>,
    ) -> Result<(), Error> {
        let key = (channel, market.map(str::to_string));
        self.send_command(&WsCommand::Unsubscribe {
            channel,
            market: key.1.clone(),
        })
        .await?;
        self.subscriptions.remove(&key);
        Ok(())
    }

    /// Forward an engine-issued subscription request.
    ///
    /// Subscribe requests go through the duplicate suppression of
    /// [`WebSocketClient::subscribe`]; everything else is sent as-is.
    pub async fn forward(&mut self, cmd: WsCommand) -> Result<(), Error> {
        match cmd {
            WsCommand::Subscribe { channel, market } => {
                self.subscribe(channel, market.as_deref()).await?;
            }
            WsCommand::Unsubscribe { channel, market } => {
                self.unsubscribe(channel, market.as_deref()).await?;
            }
            other => self.send_command(&other).await?,
        }
        Ok(())
    }

    /// Send an application-level keepalive ping
    pub async fn ping(&mut self) -> Result<(), Error> {
        self.send_command(&WsCommand::Ping).await
    }

    /// Check whether `(channel, market)` has been subscribed
    pub fn is_subscribed(&self, channel: Channel, market: Option<&str>) -> bool {
        self.subscriptions
            .contains(&(channel, market.map(str::to_string)))
    }

    /// Currently requested subscriptions
    pub fn subscriptions(&self) -> impl Iterator<Item = (Channel, Option<&str>)> + '_ {
        self.subscriptions
            .iter()
            .map(|(channel, market)| (*channel, market.as_deref()))
    }

    /// Receive the next protocol message.
    ///
    /// Transport pings are answered inline. A server `info` frame with the
    /// reconnect code surfaces as [`Error::Reconnect`]; reconnect policy
    /// is the caller's. Server `error` frames surface as
    /// [`Error::Server`].
    ///
    /// # Returns
    ///
    /// The next message, or `None` if the connection is closed.
    pub async fn next(&mut self) -> Option<Result<WsMessage, Error>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => {
                    let msg: WsMessage = match serde_json::from_str(&text) {
                        Ok(msg) => msg,
                        Err(e) => return Some(Err(Error::from(e))),
                    };
                    match msg {
                        WsMessage::Info(info) if info.code == INFO_CODE_RECONNECT => {
                            warn!(msg = ?info.msg, "server requested reconnect");
                            return Some(Err(Error::Reconnect));
                        }
                        WsMessage::Error(err) => {
                            return Some(Err(Error::Server {
                                code: err.code,
                                msg: err.msg,
                            }));
                        }
                        msg => return Some(Ok(msg)),
                    }
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = self.write.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Ok(Message::Close(_)) => {
                    return Some(Err(Error::ConnectionClosed));
                }
                Ok(_) => {
                    // Ignore other frame types (Binary, Pong, Frame)
                    continue;
                }
                Err(e) => {
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<(), Error> {
        self.write.close().await?;
        Ok(())
    }
}
