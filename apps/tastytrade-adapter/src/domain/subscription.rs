//! Subscription Tracking
//!
//! Domain types for live market-data subscriptions and the concurrent
//! registry that owns them.
//!
//! # Design
//!
//! The registry is keyed by *venue* symbol because the receive path maps
//! inbound wire symbols back to subscriptions; a canonical-symbol index is
//! kept alongside for the engine-facing subscribe/unsubscribe path. A lookup
//! miss on dispatch is expected under concurrent unsubscribe and means the
//! message must be dropped silently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::RwLock;

use super::symbol::CanonicalSymbol;

/// Which tick kinds a subscription wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTypes {
    /// Deliver quote ticks.
    pub quotes: bool,
    /// Deliver trade ticks.
    pub trades: bool,
}

impl TickTypes {
    /// Both quotes and trades.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            quotes: true,
            trades: true,
        }
    }

    /// Quotes only.
    #[must_use]
    pub const fn quotes_only() -> Self {
        Self {
            quotes: true,
            trades: false,
        }
    }

    /// Trades only.
    #[must_use]
    pub const fn trades_only() -> Self {
        Self {
            quotes: false,
            trades: true,
        }
    }
}

impl Default for TickTypes {
    fn default() -> Self {
        Self::all()
    }
}

/// One symbol's live-data intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Engine-side identity.
    pub symbol: CanonicalSymbol,
    /// Venue-specific encoding of the symbol.
    pub venue_symbol: String,
    /// Exchange time zone used to localize tick timestamps.
    pub exchange_time_zone: Tz,
    /// Tick kinds this subscription wants.
    pub tick_types: TickTypes,
}

/// Concurrent registry of active subscriptions.
///
/// All operations are safe under concurrent subscribe/unsubscribe from
/// multiple tasks; callers never need an external lock. At most one
/// subscription per canonical symbol is active at a time.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_venue: RwLock<HashMap<String, Arc<Subscription>>>,
    venue_by_canonical: RwLock<HashMap<CanonicalSymbol, String>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription.
    ///
    /// Idempotent: re-adding an already-subscribed canonical symbol replaces
    /// the stored metadata instead of duplicating the entry. Returns `true`
    /// when the symbol was newly registered, `false` on a refresh.
    pub fn insert(&self, subscription: Subscription) -> bool {
        let mut canonical = self.venue_by_canonical.write();
        let mut venue = self.by_venue.write();

        let replaced = canonical.insert(
            subscription.symbol.clone(),
            subscription.venue_symbol.clone(),
        );
        if let Some(old_venue) = &replaced {
            // The venue encoding may have changed on refresh; drop the old key.
            if *old_venue != subscription.venue_symbol {
                venue.remove(old_venue);
            }
        }
        venue.insert(
            subscription.venue_symbol.clone(),
            Arc::new(subscription),
        );

        replaced.is_none()
    }

    /// Remove the subscription for a canonical symbol.
    ///
    /// Removing a symbol that is not subscribed is a no-op, not an error.
    pub fn remove(&self, symbol: &CanonicalSymbol) -> Option<Arc<Subscription>> {
        let mut canonical = self.venue_by_canonical.write();
        let mut venue = self.by_venue.write();

        let venue_symbol = canonical.remove(symbol)?;
        venue.remove(&venue_symbol)
    }

    /// Map an inbound venue symbol back to its subscription.
    ///
    /// `None` means the subscription was removed (possibly concurrently with
    /// an in-flight message) and the caller must drop the message silently.
    #[must_use]
    pub fn lookup(&self, venue_symbol: &str) -> Option<Arc<Subscription>> {
        self.by_venue.read().get(venue_symbol).cloned()
    }

    /// Check whether a canonical symbol is currently subscribed.
    #[must_use]
    pub fn contains(&self, symbol: &CanonicalSymbol) -> bool {
        self.venue_by_canonical.read().contains_key(symbol)
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_venue.read().len()
    }

    /// Check whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_venue.read().is_empty()
    }

    /// Snapshot of all active venue symbols.
    #[must_use]
    pub fn active_venue_symbols(&self) -> Vec<String> {
        self.by_venue.read().keys().cloned().collect()
    }

    /// Remove every subscription, returning the drained entries.
    pub fn drain(&self) -> Vec<Arc<Subscription>> {
        let mut canonical = self.venue_by_canonical.write();
        let mut venue = self.by_venue.write();

        canonical.clear();
        venue.drain().map(|(_, sub)| sub).collect()
    }
}
