use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::traits::BalanceBackend;
use crate::models::balance::ExchangeBalanceSnapshot;
use crate::models::settings::ClientSettings;
use crate::models::ticker::TickerPayload;
use crate::state::handle::StoreHandle;
use crate::state::store::{EnrichmentWrite, Generation};
use crate::views::{token_row, ViewSink};

/// Counters of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub batches: usize,
    pub requested: usize,
    pub enriched: usize,
    /// Tickers the backend had no data for
    pub unavailable: usize,
    /// Writes dropped because a newer snapshot was installed or the token vanished
    pub discarded: usize,
}

impl EnrichmentReport {
    fn absorb(&mut self, other: EnrichmentReport) {
        self.batches += other.batches;
        self.requested += other.requested;
        self.enriched += other.enriched;
        self.unavailable += other.unavailable;
        self.discarded += other.discarded;
    }
}

/// How a single ticker fetch ended.
enum TickerOutcome {
    Enriched,
    Unavailable,
    Discarded,
}

/// Backfills 1h/4h/24h change data after the base snapshot is on screen.
///
/// - **Selection**: only tokens with `value_usd > 0`.
/// - **Throttle**: fixed-size batches fetched concurrently, with a pause
///   between batches. Batch N+1 starts after every request of batch N settled.
/// - **Writes**: each ticker lands in the store and on its row as soon as
///   its own request returns, not when the whole batch is done.
/// - **Failures**: a missing ticker leaves that token unenriched and never
///   stops the batch.
/// - **Races**: writes carry the snapshot generation they were started for;
///   the store drops them once a newer snapshot is installed.
pub struct EnrichmentService {
    backend: Arc<dyn BalanceBackend>,
    batch_size: usize,
    batch_delay: Duration,
}

impl EnrichmentService {
    pub fn new(backend: Arc<dyn BalanceBackend>, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub fn from_settings(backend: Arc<dyn BalanceBackend>, settings: &ClientSettings) -> Self {
        Self::new(backend, settings.enrichment_batch_size, settings.batch_delay())
    }

    /// Symbols worth enriching, in snapshot order.
    pub fn select_tokens(exchange: &ExchangeBalanceSnapshot) -> Vec<String> {
        exchange
            .tokens
            .values()
            .filter(|t| t.has_value())
            .map(|t| t.symbol.clone())
            .collect()
    }

    /// Enrich one exchange's valued tokens under `generation`.
    pub async fn enrich_exchange(
        &self,
        store: &StoreHandle,
        sink: &dyn ViewSink,
        generation: Generation,
        exchange_id: &str,
        symbols: Vec<String>,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        if symbols.is_empty() {
            return report;
        }

        store.update(|s| s.register_progress(exchange_id, symbols.len()));

        let batches: Vec<&[String]> = symbols.chunks(self.batch_size).collect();
        let batch_count = batches.len();

        for (i, batch) in batches.into_iter().enumerate() {
            let fetches = batch.iter().map(|symbol| async move {
                let ticker = self.backend.get_token_ticker(exchange_id, symbol).await;
                self.apply(store, sink, generation, exchange_id, symbol, ticker)
            });
            let outcomes = join_all(fetches).await;

            report.batches += 1;
            report.requested += batch.len();
            for outcome in outcomes {
                match outcome {
                    TickerOutcome::Enriched => report.enriched += 1,
                    TickerOutcome::Unavailable => report.unavailable += 1,
                    TickerOutcome::Discarded => report.discarded += 1,
                }
            }

            if i + 1 < batch_count {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        log::debug!(
            "Enriched {}/{} tokens on {exchange_id} in {} batches",
            report.enriched,
            report.requested,
            report.batches
        );
        report
    }

    /// Write one settled fetch into the store and notify the sink.
    /// Runs as soon as that fetch returns, without waiting for its batch.
    fn apply(
        &self,
        store: &StoreHandle,
        sink: &dyn ViewSink,
        generation: Generation,
        exchange_id: &str,
        symbol: &str,
        ticker: Option<TickerPayload>,
    ) -> TickerOutcome {
        let Some(ticker) = ticker else {
            log::debug!("No ticker for {symbol} on {exchange_id}");
            return TickerOutcome::Unavailable;
        };

        let (write, row, visible, progress) = store.update(|s| {
            let write = s.apply_enrichment(generation, exchange_id, symbol, ticker);
            let row = s
                .portfolio()
                .and_then(|p| p.token(exchange_id, symbol))
                .map(|t| token_row(t, s.preferences()));
            (write, row, s.is_row_visible(exchange_id), s.progress().clone())
        });

        match write {
            EnrichmentWrite::Applied => {
                sink.progress(&progress);
                if let (true, Some(row)) = (visible, row) {
                    sink.row_update(exchange_id, &row);
                }
                TickerOutcome::Enriched
            }
            EnrichmentWrite::StaleGeneration | EnrichmentWrite::TokenMissing => {
                log::warn!("Discarded ticker for {symbol} on {exchange_id}: {write:?}");
                TickerOutcome::Discarded
            }
        }
    }

    /// Enrich several exchanges concurrently; each runs its own batch sequence.
    pub async fn enrich_exchanges(
        &self,
        store: &StoreHandle,
        sink: &dyn ViewSink,
        generation: Generation,
        exchange_ids: &[String],
    ) -> EnrichmentReport {
        let work: Vec<(String, Vec<String>)> = store.read(|s| {
            exchange_ids
                .iter()
                .filter_map(|id| {
                    let exchange = s.portfolio()?.exchange(id)?;
                    Some((id.clone(), Self::select_tokens(exchange)))
                })
                .collect()
        });

        let runs = work.into_iter().map(|(exchange_id, symbols)| async move {
            self.enrich_exchange(store, sink, generation, &exchange_id, symbols)
                .await
        });

        let mut total = EnrichmentReport::default();
        for report in join_all(runs).await {
            total.absorb(report);
        }
        total
    }
}
