//! Order book reconstruction engine.
//!
//! [`OrderBookEngine`] consumes parsed `orderbook` channel frames from the
//! single transport receive task and maintains the store:
//!
//! 1. full snapshots clear the market before levels are applied;
//! 2. every `[price, size]` pair is upserted (size `0` removes);
//! 3. the server timestamp is recorded unconditionally - the message *was*
//!    the book at that time, divergence is discovered after the fact;
//! 4. the post-apply book is checked against the exchange checksum;
//! 5. on a match waiting readers are woken, on a mismatch the market is
//!    reset and an unsubscribe/resubscribe pair goes out through the
//!    subscription channel. Recovery completes when the fresh snapshot
//!    re-enters through step 1.
//!
//! Readers never see a checksum failure as an error; during the resync
//! window they observe an empty book and a timestamp that stops advancing.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Error;
use crate::types::messages::{BookAction, Channel, DataMsg, OrderBookData, WsCommand};
use crate::types::{Price, Timestamp};

use super::book::{BookSnapshot, Side};
use super::checksum;
use super::notify::UpdateNotifier;
use super::store::OrderBookStore;

/// Multi-market book engine: delta application, checksum verification,
/// resync coordination, and update notification.
///
/// # Concurrency
///
/// [`OrderBookEngine::apply`] is meant to be called from one ingestion
/// task, in arrival order; that serialization is what makes each message
/// atomic. Reads ([`OrderBookEngine::order_book`],
/// [`OrderBookEngine::timestamp`], [`OrderBookEngine::wait_for_update`])
/// are safe from any task at any time.
#[derive(Debug)]
pub struct OrderBookEngine {
    store: OrderBookStore,
    notifier: UpdateNotifier,
    /// Outbound subscription requests; the transport owner drains these
    /// onto the socket. Keeping this a channel keeps the engine free of
    /// transport types and lets tests observe resync traffic directly.
    subscriptions: mpsc::UnboundedSender<WsCommand>,
}

impl OrderBookEngine {
    /// Create an engine plus the receiver for its subscription requests.
    ///
    /// The caller (normally [`crate::FeedClient`]) must forward every
    /// received [`WsCommand`] to the exchange, in order.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WsCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                store: OrderBookStore::new(),
                notifier: UpdateNotifier::new(),
                subscriptions: tx,
            },
            rx,
        )
    }

    /// Route an `orderbook` channel frame into the engine.
    ///
    /// Frames for other channels are ignored (`Ok(false)`).
    ///
    /// # Errors
    ///
    /// Fails on a missing market name, an undecodable payload, or a
    /// malformed level; see [`OrderBookEngine::apply`].
    pub fn handle_message(&self, frame: &DataMsg) -> Result<bool, Error> {
        if frame.channel != Channel::Orderbook {
            return Ok(false);
        }
        let market = frame.market.as_deref().ok_or(Error::MissingMarket)?;
        let data = frame.order_book()?;
        self.apply(market, &data)
    }

    /// Apply one snapshot-or-update message for `market`.
    ///
    /// Returns `Ok(true)` if the post-apply book matched the exchange
    /// checksum, `Ok(false)` if it mismatched and a resync was issued.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLevel`] if any level carries a negative or
    /// non-finite price or size. The message is rejected whole: validation
    /// runs before any mutation, so the book is left exactly as it was.
    pub fn apply(&self, market: &str, data: &OrderBookData) -> Result<bool, Error> {
        for &[price, size] in data.bids.iter().chain(data.asks.iter()) {
            if !(price.is_finite() && size.is_finite() && price >= 0.0 && size >= 0.0) {
                return Err(Error::InvalidLevel {
                    market: market.to_string(),
                    price,
                    size,
                });
            }
        }

        self.store.get_or_create(market);

        // One entry write lock across the whole message: readers see all
        // of its levels or none of them.
        let snapshot = self
            .store
            .with_entry(market, |book, timestamp| {
                if data.action == BookAction::Snapshot {
                    book.clear();
                }
                for &[price, size] in &data.bids {
                    book.upsert(Side::Bid, Price(price), size);
                }
                for &[price, size] in &data.asks {
                    book.upsert(Side::Ask, Price(price), size);
                }
                *timestamp = Some(data.time);
                book.snapshot()
            })
            .unwrap_or_default();

        if checksum::verify(&snapshot, data.checksum) {
            debug!(
                market,
                action = ?data.action,
                bids = snapshot.bids.len(),
                asks = snapshot.asks.len(),
                "book updated"
            );
            self.notifier.signal(market);
            Ok(true)
        } else {
            warn!(
                market,
                expected = data.checksum,
                computed = checksum::checksum(&snapshot),
                "book checksum mismatch, resyncing"
            );
            self.resync(market)?;
            Ok(false)
        }
    }

    /// Reset `market` and request a fresh subscription.
    ///
    /// Safe to call repeatedly before the fresh snapshot arrives: each
    /// call resets the (already empty) book and repeats the
    /// unsubscribe/subscribe pair without compounding any state.
    ///
    /// # Errors
    ///
    /// [`Error::SubscriptionChannelClosed`] if the transport side of the
    /// subscription channel is gone.
    pub fn resync(&self, market: &str) -> Result<(), Error> {
        self.store.reset(market);
        self.subscriptions
            .send(WsCommand::unsubscribe(Channel::Orderbook, market))
            .and_then(|()| {
                self.subscriptions
                    .send(WsCommand::subscribe(Channel::Orderbook, market))
            })
            .map_err(|_| Error::SubscriptionChannelClosed)
    }

    /// Reset every market, e.g. across a transport reconnect.
    ///
    /// Subscriptions are not re-requested here; the transport layer
    /// replays its own subscription set after reconnecting.
    pub fn reset_all(&self) {
        for market in self.store.markets() {
            self.store.reset(&market);
        }
    }

    /// Pre-register a market, creating its (empty) book and signal handle
    pub fn track(&self, market: &str) {
        self.store.get_or_create(market);
        self.notifier.register(market);
    }

    /// Sorted point-in-time copy of one market's book
    #[must_use]
    pub fn order_book(&self, market: &str) -> BookSnapshot {
        self.store.snapshot(market)
    }

    /// Server time of the last applied message, `None` if never updated
    #[must_use]
    pub fn timestamp(&self, market: &str) -> Option<Timestamp> {
        self.store.timestamp(market)
    }

    /// Block until the next verified update for `market`.
    ///
    /// Returns `false` on timeout (`None` waits indefinitely). A timeout
    /// is not an error; check [`OrderBookEngine::timestamp`] to tell "no
    /// data yet" from "no fresh data".
    pub async fn wait_for_update(&self, market: &str, timeout: Option<std::time::Duration>) -> bool {
        self.notifier.wait_for(market, timeout).await
    }

    /// Snapshot of the book, first waiting up to `timeout` for a verified
    /// image when no message has ever arrived for `market`.
    pub async fn order_book_fresh(
        &self,
        market: &str,
        timeout: std::time::Duration,
    ) -> BookSnapshot {
        if self.timestamp(market).is_none() {
            self.wait_for_update(market, Some(timeout)).await;
        }
        self.order_book(market)
    }
}
