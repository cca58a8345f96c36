use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::Utc;
use common::config::{CadencePolicy, Settings};
use common::models::{Series, Timeframe};
use common::notifier::Notifier;
use common::params::RuntimeParams;
use futures_util::future::join_all;
use market_data::{MarketDataError, MarketDataSource};
use strategy::{
    EmaCrossStrategy, Evaluation, RsiCrossStrategy, SignalStateStore, SignalStrategy,
    calc_oco_prices,
};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::services::alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    ValidatingSymbols,
    WarmupProbe,
    Running,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of one sweep over the watch list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub total: usize,
    pub succeeded: usize,
    pub alerts: usize,
}

/// Polls market data, runs every strategy per symbol and alerts on signal
/// transitions.
pub struct SignalService {
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    params: Arc<RuntimeParams>,
    strategies: Vec<Box<dyn SignalStrategy>>,
    store: SignalStateStore,
    phase: Phase,
    symbols: Vec<String>,
    timeframe: Timeframe,
    history_limit: usize,
    error_threshold: u32,
    fetch_timeout: Duration,
    status_interval: Duration,
    ping_interval: Duration,
    cadence: CadencePolicy,
    failed_cycles: u32,
    last_status: Instant,
    last_ping: Instant,
}

impl SignalService {
    pub fn new(
        settings: &Settings,
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
        params: Arc<RuntimeParams>,
    ) -> Self {
        let now = Instant::now();
        Self {
            source,
            notifier,
            params,
            strategies: vec![
                Box::new(EmaCrossStrategy::new()),
                Box::new(RsiCrossStrategy::new()),
            ],
            store: SignalStateStore::new(),
            phase: Phase::Initializing,
            symbols: settings.symbols.clone(),
            timeframe: settings.timeframe,
            history_limit: settings.history_limit,
            error_threshold: settings.error_threshold,
            fetch_timeout: settings.fetch_timeout,
            status_interval: settings.status_interval,
            ping_interval: settings.ping_interval,
            cadence: settings.cadence,
            failed_cycles: 0,
            last_status: now,
            last_ping: now,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn failed_cycles(&self) -> u32 {
        self.failed_cycles
    }

    pub fn store(&self) -> &SignalStateStore {
        &self.store
    }

    /// Runs until the failure threshold is reached. Startup failures and
    /// threshold breaches are returned as errors after a final alert.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.validate_symbols().await?;
        self.warmup_probe().await?;

        self.set_phase(Phase::Running);
        info!(
            "EMA signals bot (two strategies) running on {} pairs",
            self.symbols.len()
        );

        loop {
            let report = self.run_cycle().await;
            self.record_cycle(&report).await?;
            self.send_heartbeats(&report).await;

            let wait = self.cadence.next_wait(Utc::now());
            debug!("Waiting {:.1}s until the next check", wait.as_secs_f64());
            sleep(wait).await;
        }
    }

    /// Keeps the watch-list symbols the exchange currently trades, in
    /// watch-list order.
    pub async fn validate_symbols(&mut self) -> anyhow::Result<()> {
        self.set_phase(Phase::ValidatingSymbols);
        debug!("Checking availability of {} pairs", self.symbols.len());

        let listed = match timeout(self.fetch_timeout, self.source.list_tradable_symbols()).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout(self.fetch_timeout)),
        };
        let tradable = match listed {
            Ok(tradable) => tradable,
            Err(e) => return self.abort("could not load trading pairs", e).await,
        };

        let (valid, dropped): (Vec<String>, Vec<String>) = self
            .symbols
            .iter()
            .cloned()
            .partition(|s| tradable.contains(s));
        if !dropped.is_empty() {
            warn!("Unavailable pairs: {:?}", dropped);
        }
        if valid.is_empty() {
            return self
                .abort("could not load trading pairs", "no tradable pairs")
                .await;
        }

        info!("Available pairs: {:?}", valid);
        self.symbols = valid;
        self.deliver(&alert::started(self.symbols.len())).await;
        Ok(())
    }

    /// One fetch for the first symbol to prove the exchange is reachable.
    pub async fn warmup_probe(&mut self) -> anyhow::Result<()> {
        self.set_phase(Phase::WarmupProbe);
        let Some(symbol) = self.symbols.first().cloned() else {
            return self
                .abort("could not connect to the exchange", "no pairs to probe")
                .await;
        };

        match self.fetch(&symbol).await {
            Ok(_) => {
                info!("Test request for {} succeeded", symbol);
                self.deliver(&alert::probe_ok(&symbol)).await;
                Ok(())
            }
            Err(e) => self.abort("could not connect to the exchange", e).await,
        }
    }

    /// Fetches every symbol concurrently, then evaluates the ones that
    /// arrived. Failed symbols are logged and left out of this cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let symbols = self.symbols.clone();
        debug!("Processing {} pairs", symbols.len());

        let results = join_all(symbols.iter().map(|symbol| self.fetch(symbol))).await;
        debug!("Fetched data for all pairs");

        let mut report = CycleReport {
            total: symbols.len(),
            ..CycleReport::default()
        };
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(series) => {
                    report.succeeded += 1;
                    report.alerts += self.process_series(symbol, &series).await;
                }
                Err(e) => error!("Error processing {}: {}", symbol, e),
            }
        }

        info!("Processed {}/{} pairs", report.succeeded, report.total);
        report
    }

    /// A cycle without a single successful symbol is a failed cycle.
    pub async fn record_cycle(&mut self, report: &CycleReport) -> anyhow::Result<()> {
        if report.succeeded > 0 {
            self.failed_cycles = 0;
            return Ok(());
        }

        self.failed_cycles += 1;
        if self.failed_cycles < self.error_threshold {
            error!(
                "Cycle failed: no pairs processed ({}/{})",
                self.failed_cycles, self.error_threshold
            );
            return Ok(());
        }

        error!(
            "Bot stopped: {} consecutive cycles failed",
            self.failed_cycles
        );
        self.deliver(&alert::stopped(self.failed_cycles)).await;
        self.set_phase(Phase::Stopped);
        bail!("{} consecutive cycles failed", self.failed_cycles)
    }

    async fn send_heartbeats(&mut self, report: &CycleReport) {
        let now = Instant::now();
        if now.duration_since(self.last_status) >= self.status_interval {
            self.deliver(&alert::status(report.succeeded, report.total))
                .await;
            self.last_status = now;
        }
        if now.duration_since(self.last_ping) >= self.ping_interval {
            self.deliver(&alert::ping()).await;
            self.last_ping = now;
        }
    }

    async fn process_series(&mut self, symbol: &str, series: &Series) -> usize {
        let mut alerts = 0;
        for strategy in &self.strategies {
            let id = strategy.id();
            let Evaluation::Triggered(detection) = strategy.evaluate(series, self.history_limit)
            else {
                continue;
            };

            if !self.store.is_transition(symbol, id, detection.signal) {
                debug!("{} {} for {} already reported", id, detection.signal, symbol);
                continue;
            }

            let oco = calc_oco_prices(
                detection.signal.direction(),
                detection.price,
                self.params.take_profit_pct(),
                self.params.stop_loss_pct(),
            );
            let text = alert::signal(symbol, id, &detection, &oco, self.timeframe);
            self.deliver(&text).await;

            match detection.rsi {
                Some((prev, last)) => info!(
                    "{} {}: {} (price {}) RSI: {:.1} -> {:.1}",
                    id, symbol, detection.signal, detection.price, prev, last
                ),
                None => info!(
                    "{} {}: {} (price {})",
                    id, symbol, detection.signal, detection.price
                ),
            }
            self.store.set(symbol, id, detection.signal);
            alerts += 1;
        }
        alerts
    }

    async fn fetch(&self, symbol: &str) -> Result<Series, MarketDataError> {
        let request = self
            .source
            .fetch_series(symbol, self.timeframe, self.history_limit);
        match timeout(self.fetch_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout(self.fetch_timeout)),
        }
    }

    /// One log line per attempt. Failures are not retried.
    async fn deliver(&self, text: &str) -> bool {
        let summary = text.lines().next().unwrap_or_default();
        match self.notifier.send(text).await {
            Ok(()) => {
                info!("Message sent: {}", summary);
                true
            }
            Err(e) => {
                error!("Failed to send message ({}): {}", summary, e);
                false
            }
        }
    }

    async fn abort<E: fmt::Display>(&mut self, context: &str, e: E) -> anyhow::Result<()> {
        error!("Critical error: {}: {}", context, e);
        self.deliver(&alert::fatal(context, &e)).await;
        self.set_phase(Phase::Stopped);
        bail!("{}: {}", context, e)
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!("Phase {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }
}
