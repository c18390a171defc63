//! Load orchestration
//!
//! The loader owns the only writer role against the store. It pulls raw
//! records through the [`TradeGateway`] boundary (paginated, strictly
//! serial), runs them through normalize → grade → analyze, and publishes the
//! results under fixed store keys. Macro series go through a fan-out/join
//! where each sub-request fails independently.
//!
//! Network, authentication, and retry policy all live behind the gateway
//! traits; this crate never opens a connection itself.

#[cfg(test)]
mod tests;

use crate::analytics::{self, JournalStats};
use crate::config::{CacheConfig, LoaderConfig};
use crate::error::{JournalError, Result};
use crate::grader;
use crate::normalizer;
use crate::simulator::{MonteCarlo, MonteCarloResult, SimulationParams};
use crate::store::{keys, Store};
use crate::types::{RawRecord, Trade};
use async_trait::async_trait;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

/// One page of raw trade records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePage {
    pub records: Vec<RawRecord>,
    /// Cursor for the next page; `None` ends the chain
    pub next_cursor: Option<String>,
}

/// One observation of a macro series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: String,
    pub value: Decimal,
}

/// Paginated access to the trade journal source
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TradeGateway: Send + Sync {
    async fn fetch_page(&self, cursor: Option<String>) -> Result<TradePage>;
}

/// Access to macroeconomic series
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SeriesGateway: Send + Sync {
    async fn fetch_series(&self, series: String) -> Result<Vec<SeriesPoint>>;
}

/// Pulls the trade journal and publishes trades + statistics
pub struct TradeLoader {
    store: Arc<Store>,
    loader: LoaderConfig,
    cache: CacheConfig,
}

impl TradeLoader {
    pub fn new(store: Arc<Store>, loader: LoaderConfig, cache: CacheConfig) -> Self {
        Self {
            store,
            loader,
            cache,
        }
    }

    /// Load the journal unless the `trades` slice is still fresh.
    ///
    /// Pagination is strictly serial; `on_progress` fires with the running
    /// record count after each absorbed page. Any failure leaves the
    /// previous slices and their timestamps untouched.
    ///
    /// Returns `None` on a cache hit, otherwise the freshly computed stats.
    pub async fn load<G>(
        &self,
        gateway: &G,
        mut on_progress: impl FnMut(usize),
    ) -> Result<Option<JournalStats>>
    where
        G: TradeGateway + ?Sized,
    {
        if !self.store.is_stale(keys::TRADES, self.cache.trades_ttl()) {
            debug!("trades cache hit, skipping load");
            return Ok(None);
        }

        let records = self.fetch_all_pages(gateway, &mut on_progress).await?;

        let trades: Vec<Trade> = normalizer::normalize_all(&records)
            .into_iter()
            .map(|mut t| {
                t.grade = Some(grader::grade(&t));
                t
            })
            .filter(|t| t.date.is_some())
            .collect();
        let dropped = records.len() - trades.len();
        if dropped > 0 {
            debug!("{} records without a parseable date excluded", dropped);
        }

        let stats = analytics::analyze(&trades);
        self.store.set(keys::TRADES, serde_json::to_value(&trades)?);
        self.store
            .set(keys::JOURNAL_STATS, serde_json::to_value(&stats)?);
        self.store.merge(
            keys::AI_CONTEXT,
            json!({
                "journalStats": {
                    "totalTrades": stats.trades.len(),
                    "winRate": stats.win_rate,
                    "avgWin": stats.avg_win,
                    "avgLoss": stats.avg_loss,
                    "ev": stats.ev,
                    "totalR": stats.cur_r,
                    "peakR": stats.peak_r,
                    "drawdown": stats.drawdown,
                }
            }),
        );
        info!(
            "loaded {} trades, win rate {}%",
            stats.trades.len(),
            stats.win_rate
        );
        Ok(Some(stats))
    }

    async fn fetch_all_pages<G>(
        &self,
        gateway: &G,
        on_progress: &mut impl FnMut(usize),
    ) -> Result<Vec<RawRecord>>
    where
        G: TradeGateway + ?Sized,
    {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = timeout(
                self.loader.fetch_timeout(),
                gateway.fetch_page(cursor.clone()),
            )
            .await
            .map_err(|_| JournalError::Timeout("trade page fetch"))??;

            records.extend(page.records);
            pages += 1;
            on_progress(records.len());

            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
            if pages >= self.loader.max_pages {
                warn!(
                    "cursor chain still open after {} pages, truncating",
                    pages
                );
                break;
            }
        }
        Ok(records)
    }
}

/// Project forward account risk from the published journal statistics.
///
/// Reads the simulation scalars off the `journalStats` slice, runs the
/// simulator, and publishes the result under `monteCarlo`.
pub fn project_risk(
    store: &Store,
    simulator: &MonteCarlo,
    runs: Option<usize>,
) -> Result<MonteCarloResult> {
    let stats: JournalStats = store
        .get_as(keys::JOURNAL_STATS)
        .ok_or(JournalError::MissingSlice(keys::JOURNAL_STATS))?;

    let result = simulator.simulate(&SimulationParams {
        win_rate_pct: Decimal::from(stats.win_rate),
        avg_win: stats.avg_win,
        avg_loss: stats.avg_loss,
        trade_count: stats.trades.len(),
        runs,
    })?;
    store.set(keys::MONTE_CARLO, serde_json::to_value(&result)?);
    Ok(result)
}

/// Refreshes macro series with isolated per-series failures
pub struct MacroLoader {
    store: Arc<Store>,
    loader: LoaderConfig,
    cache: CacheConfig,
}

impl MacroLoader {
    pub fn new(store: Arc<Store>, loader: LoaderConfig, cache: CacheConfig) -> Self {
        Self {
            store,
            loader,
            cache,
        }
    }

    /// Fetch every configured series concurrently and publish the join.
    ///
    /// Failed series are logged and omitted; only when every series fails is
    /// the previous slice left in place and an error returned. Returns the
    /// number of series loaded (0 on a cache hit).
    pub async fn refresh<G>(&self, gateway: &G) -> Result<usize>
    where
        G: SeriesGateway + ?Sized,
    {
        if !self.store.is_stale(keys::MACRO, self.cache.macro_ttl()) {
            debug!("macro cache hit, skipping refresh");
            return Ok(0);
        }
        if self.loader.macro_series.is_empty() {
            return Ok(0);
        }

        let fetch_timeout = self.loader.fetch_timeout();
        let fetches = self.loader.macro_series.iter().map(|series| {
            let series = series.clone();
            async move {
                let result = timeout(fetch_timeout, gateway.fetch_series(series.clone())).await;
                (series, result)
            }
        });

        let mut slice = serde_json::Map::new();
        for (series, outcome) in join_all(fetches).await {
            match outcome {
                Ok(Ok(points)) => {
                    slice.insert(series, serde_json::to_value(points)?);
                }
                Ok(Err(e)) => warn!("macro series {} failed: {}", series, e),
                Err(_) => warn!("macro series {} timed out", series),
            }
        }

        if slice.is_empty() {
            return Err(JournalError::Gateway(
                "all macro series failed".to_string(),
            ));
        }

        let loaded = slice.len();
        self.store.set(keys::MACRO, serde_json::Value::Object(slice));
        info!("macro refresh complete, {} series", loaded);
        Ok(loaded)
    }
}
