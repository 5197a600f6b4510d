//! Book checksum verification.
//!
//! The exchange publishes a CRC-32 digest with every order book message so
//! clients can detect silent divergence. The digest covers a canonical
//! string built from the top [`CHECKSUM_DEPTH`] levels of each side,
//! interleaved bid/ask/bid/ask with the longer side's tail appended once
//! the shorter side runs out, each level rendered as `price:size` and all
//! levels joined with `:`.
//!
//! Getting the numeric text exactly right is load-bearing: the exchange
//! rendered each value with Python's float formatting when it computed the
//! digest, so integral values carry a trailing `.0` (`20000.0`, not
//! `20000`). A formatting mismatch is indistinguishable from real desync
//! and shows up as a continuous resync loop.

use super::book::BookSnapshot;

/// Levels per side included in the checksum
pub const CHECKSUM_DEPTH: usize = 100;

/// Compute the CRC-32 digest of a book snapshot
#[must_use]
pub fn checksum(snapshot: &BookSnapshot) -> u32 {
    crc32fast::hash(canonical_string(snapshot).as_bytes())
}

/// Check a snapshot against the digest the exchange sent.
///
/// Pure and read-only; call only after the message's levels are fully
/// applied, since the digest covers the post-apply book.
#[must_use]
pub fn verify(snapshot: &BookSnapshot, expected: u32) -> bool {
    checksum(snapshot) == expected
}

/// Build the canonical interleaved string for a snapshot
fn canonical_string(snapshot: &BookSnapshot) -> String {
    let bids = &snapshot.bids[..snapshot.bids.len().min(CHECKSUM_DEPTH)];
    let asks = &snapshot.asks[..snapshot.asks.len().min(CHECKSUM_DEPTH)];

    let mut parts = Vec::with_capacity(bids.len() + asks.len());
    for i in 0..bids.len().max(asks.len()) {
        for side in [bids, asks] {
            if let Some(&(price, size)) = side.get(i) {
                parts.push(format!("{}:{}", format_value(price), format_value(size)));
            }
        }
    }
    parts.join(":")
}

/// Render a price or size the way the exchange did when it signed the book.
///
/// Integral values get a trailing `.0` as Python's float repr produces;
/// everything else uses Rust's shortest round-trip decimal, which agrees
/// with Python for the magnitudes real markets quote. Values large enough
/// for Python to switch to exponent notation are not representable as
/// exchange prices.
fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
