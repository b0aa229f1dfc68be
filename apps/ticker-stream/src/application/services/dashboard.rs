//! Dashboard Orchestrator
//!
//! Ties the snapshot provider, the price store, the live stream and the
//! presentation sink together.
//!
//! # Rebuild Cycle
//!
//! ```text
//! close current subscription ─▶ fetch snapshot ─▶ seed store
//!        ─▶ render snapshot ─▶ derive symbol set ─▶ subscribe
//! ```
//!
//! Every rebuild takes a generation number. A snapshot that resolves after a
//! newer rebuild (or a shutdown) has started is discarded and reported as
//! [`RebuildOutcome::Superseded`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::application::ports::{
    MarketDataError, PresentationSink, SnapshotProvider, StreamHandle, StreamObserver, TickerStream,
};
use crate::domain::store::{PriceStore, SharedPriceStore};
use crate::domain::subscription::{ConnectionState, SubscriptionSet};
use crate::domain::ticker::{TickerFields, TickerSnapshot};
use crate::infrastructure::metrics::{self, DropReason};

/// Result of a rebuild that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The snapshot was applied and a subscription opened.
    Applied {
        /// Number of streamed symbols.
        symbols: usize,
    },
    /// A newer rebuild started while this one was fetching.
    Superseded,
}

struct ActiveSubscription {
    handle: Box<dyn StreamHandle>,
    symbols: SubscriptionSet,
}

/// Dashboard orchestrator.
///
/// Owned by its caller; share it behind an `Arc` if several tasks need it.
/// Sink callbacks run on the stream task and must not call back into the
/// dashboard.
pub struct Dashboard {
    snapshots: Arc<dyn SnapshotProvider>,
    stream: Arc<dyn TickerStream>,
    sink: Arc<dyn PresentationSink>,
    store: SharedPriceStore,
    generation: AtomicU64,
    active: Mutex<Option<ActiveSubscription>>,
}

impl Dashboard {
    /// Create a dashboard with an empty store.
    #[must_use]
    pub fn new(
        snapshots: Arc<dyn SnapshotProvider>,
        stream: Arc<dyn TickerStream>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self::with_store(snapshots, stream, sink, PriceStore::shared())
    }

    /// Create a dashboard around an existing shared store.
    #[must_use]
    pub fn with_store(
        snapshots: Arc<dyn SnapshotProvider>,
        stream: Arc<dyn TickerStream>,
        sink: Arc<dyn PresentationSink>,
        store: SharedPriceStore,
    ) -> Self {
        Self {
            snapshots,
            stream,
            sink,
            store,
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Load the first snapshot and start streaming.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after reporting [`ConnectionState::Failed`].
    /// Nothing is retried.
    pub async fn start(&self, count: usize) -> Result<RebuildOutcome, MarketDataError> {
        tracing::info!(count, "Starting dashboard");
        self.sink
            .on_status(ConnectionState::Connecting, "Fetching cryptocurrency data...");
        self.rebuild(count).await
    }

    /// Rebuild everything for a new pair count.
    ///
    /// Live-updated values are dropped and replaced by the new snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub async fn update_count(&self, new_count: usize) -> Result<RebuildOutcome, MarketDataError> {
        tracing::info!(count = new_count, "Updating tracked pair count");
        self.sink
            .on_status(ConnectionState::Connecting, "Updating cryptocurrency list...");
        self.rebuild(new_count).await
    }

    /// Close the active subscription and discard any in-flight rebuild.
    pub fn shutdown(&self) {
        let previous = {
            let mut active = self.active.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            active.take()
        };

        if let Some(previous) = previous {
            previous.handle.close();
            tracing::info!("Dashboard subscription closed");
        }
    }

    /// Current store content in snapshot order.
    #[must_use]
    pub fn tickers(&self) -> Vec<TickerSnapshot> {
        self.store.read().get_all()
    }

    /// Shared store handle.
    #[must_use]
    pub fn store(&self) -> SharedPriceStore {
        Arc::clone(&self.store)
    }

    /// State of the active subscription, or `Idle` when there is none.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.active
            .lock()
            .as_ref()
            .map_or(ConnectionState::Idle, |active| active.handle.state())
    }

    /// Symbols of the active subscription.
    #[must_use]
    pub fn active_symbols(&self) -> Option<SubscriptionSet> {
        self.active.lock().as_ref().map(|active| active.symbols.clone())
    }

    async fn rebuild(&self, count: usize) -> Result<RebuildOutcome, MarketDataError> {
        let generation = {
            let mut active = self.active.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(previous) = active.take() {
                previous.handle.close();
            }
            generation
        };

        let fetched = self.snapshots.fetch_snapshot(count).await;

        let mut active = self.active.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::info!(generation, "Discarding snapshot from superseded rebuild");
            metrics::record_snapshot_discarded();
            return Ok(RebuildOutcome::Superseded);
        }

        let snapshot = fetched.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to load market data");
            self.sink.on_status(ConnectionState::Failed, "Failed to load data");
        })?;

        let (tickers, symbols) = {
            let mut store = self.store.write();
            store.seed(snapshot);
            (store.get_all(), SubscriptionSet::from_store(&store))
        };
        metrics::set_tracked_symbols(tickers.len());
        self.sink.on_snapshot(&tickers);

        let symbols = symbols.map_err(MarketDataError::from).inspect_err(|e| {
            tracing::error!(error = %e, "Snapshot yielded nothing to stream");
            self.sink.on_status(ConnectionState::Failed, "No pairs to stream");
        })?;

        let observer = Arc::new(StoreObserver {
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
        });
        let handle = self.stream.subscribe(&symbols, observer);
        let streamed = symbols.len();
        *active = Some(ActiveSubscription { handle, symbols });

        tracing::info!(generation, symbols = streamed, "Dashboard rebuilt");
        Ok(RebuildOutcome::Applied { symbols: streamed })
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.handle.close();
        }
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("symbols", &self.store.read().len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Store Observer
// =============================================================================

/// Applies ticks to the store and forwards the applied ones to the sink.
struct StoreObserver {
    store: SharedPriceStore,
    sink: Arc<dyn PresentationSink>,
}

impl StreamObserver for StoreObserver {
    fn on_tick(&self, symbol: &str, fields: &TickerFields) {
        let applied = self.store.write().apply_tick(symbol, *fields);
        if applied {
            self.sink.on_update(symbol, fields);
        } else {
            tracing::trace!(symbol, "Dropping tick for untracked symbol");
            metrics::record_tick_dropped(DropReason::UnknownSymbol);
        }
    }

    fn on_status(&self, state: ConnectionState, message: &str) {
        self.sink.on_status(state, message);
    }
}
