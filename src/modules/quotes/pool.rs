//! Short-lived pool of pre-fetched random quotes.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

use quotes_model::Quote;
use quotes_upstream::{QuoteBackend, UpstreamError};

struct PoolState {
    quotes: Vec<Quote>,
    refilled_at: Option<Instant>,
}

/// Batch of random quotes refilled from the backend when it runs dry or
/// grows older than its TTL. Each quote is handed out at most once per batch.
///
/// The lock is held across the refill call, so concurrent requests wait for
/// one refill instead of issuing their own.
pub struct QuotePool {
    backend: Arc<dyn QuoteBackend>,
    size: usize,
    ttl: Duration,
    state: Mutex<PoolState>,
}

impl QuotePool {
    pub fn new(backend: Arc<dyn QuoteBackend>, size: usize, ttl: Duration) -> Self {
        Self {
            backend,
            size,
            ttl,
            state: Mutex::new(PoolState {
                quotes: Vec::with_capacity(size),
                refilled_at: None,
            }),
        }
    }

    /// Remove and return a uniformly random quote, refilling first if needed.
    /// A failed refill leaves the pool untouched.
    pub async fn take(&self) -> Result<Quote, UpstreamError> {
        let mut state = self.state.lock().await;

        if state.quotes.is_empty() || self.is_stale(&state) {
            self.refill(&mut state).await?;
        }

        let index = rand::thread_rng().gen_range(0..state.quotes.len());
        Ok(state.quotes.swap_remove(index))
    }

    /// Fill an empty or stale pool ahead of the first request.
    pub async fn warm(&self) -> Result<usize, UpstreamError> {
        let mut state = self.state.lock().await;
        if state.quotes.is_empty() || self.is_stale(&state) {
            self.refill(&mut state).await?;
        }
        Ok(state.quotes.len())
    }

    /// Quotes left in the current batch.
    pub async fn len(&self) -> usize {
        self.state.lock().await.quotes.len()
    }

    fn is_stale(&self, state: &PoolState) -> bool {
        state
            .refilled_at
            .map_or(true, |at| at.elapsed() > self.ttl)
    }

    async fn refill(&self, state: &mut PoolState) -> Result<(), UpstreamError> {
        let fresh = self.backend.random_quotes(self.size).await?;
        if fresh.is_empty() {
            return Err(UpstreamError::Empty);
        }

        tracing::debug!(count = fresh.len(), "quote pool refilled");
        state.quotes = fresh;
        state.refilled_at = Some(Instant::now());
        Ok(())
    }
}
