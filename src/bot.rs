use anyhow::Result;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

use spx_scalp_bot::alerts::{AlertEmitter, LogSink, MarketHoursGate, PushGate};
use spx_scalp_bot::config::SharedConfig;
use spx_scalp_bot::core::scoring;
use spx_scalp_bot::exchange::{MarketData, MarketFeed};
use spx_scalp_bot::models::{Strength, Timeframe, TradeState};
use spx_scalp_bot::strategies::scalp_engine::ScalpEngine;
use spx_scalp_bot::strategies::signals;
use spx_scalp_bot::trading::sizing;
use spx_scalp_bot::trading::tracker::TradeTracker;

pub struct ScalpBot {
    config: SharedConfig,
    feed: MarketFeed,
    engine: ScalpEngine,
    tracker: TradeTracker,
    emitter: AlertEmitter,
    gate: MarketHoursGate,

    last_data_refresh: Instant,
    last_status_log: Instant,
}

impl ScalpBot {
    pub async fn new(config: SharedConfig, source: Box<dyn MarketData>) -> Self {
        let cfg = config.read().await;

        info!("{}", "=".repeat(60));
        info!("SPX scalp bot starting up");
        info!("Symbol: {}", cfg.symbol);
        info!(
            "Alerts: {}",
            if cfg.alerts_enabled { "ENABLED" } else { "DISABLED" }
        );
        info!("Budget: ${:.0}", cfg.budget);
        info!("{}", "=".repeat(60));

        let gate = MarketHoursGate::new(cfg.alerts_enabled);
        drop(cfg);

        let now = Instant::now();
        Self {
            config,
            feed: MarketFeed::new(source),
            engine: ScalpEngine::new(),
            tracker: TradeTracker::new(),
            emitter: AlertEmitter::new(vec![Box::new(LogSink)]),
            gate,
            last_data_refresh: now,
            last_status_log: now,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Bot is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.shutdown();
                    return Ok(());
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&mut self) {
        let cfg = self.config.read().await.clone();

        if self.last_data_refresh.elapsed().as_secs() >= cfg.data_refresh_secs {
            if let Err(e) = self.feed.refresh(cfg.data_lookback).await {
                debug!("feed refresh: {}", e);
            }
            self.last_data_refresh = Instant::now();
        }

        self.evaluate_signal();
        self.run_engine();

        if self.last_status_log.elapsed().as_secs() >= cfg.status_log_secs {
            self.log_status(cfg.budget);
            self.last_status_log = Instant::now();
        }

        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    }

    /// Scorer -> planner -> lifecycle tracker over the latest snapshot.
    fn evaluate_signal(&mut self) {
        let snapshot = match self.feed.snapshot() {
            Some(s) => s.clone(),
            None => return,
        };
        let price = self.feed.mark_price().unwrap_or(snapshot.current_price);
        let now = Utc::now();

        if let Some(score) = scoring::score(&snapshot) {
            let signal = signals::plan(&score, &snapshot, now);
            let strength = signal.strength;
            if self.tracker.on_signal(signal, now) {
                if strength == Strength::High && self.gate.push_allowed() {
                    if let Some(sig) = self.tracker.signal() {
                        self.emitter.notify_signal(sig);
                    }
                }
                self.tracker.start_tracking(now);
            }
        }

        match self.tracker.on_tick(price) {
            Some(TradeState::Profit) | Some(TradeState::Stopped) => {
                // Outcome already logged by the tracker; free the slot.
                self.tracker.clear();
            }
            _ => {}
        }
    }

    /// Director/trap/cooldown tick over the three candle series.
    fn run_engine(&mut self) {
        let (fast, medium, slow) = match (
            self.feed.candles(Timeframe::M1),
            self.feed.candles(Timeframe::M5),
            self.feed.candles(Timeframe::M15),
        ) {
            (Some(f), Some(m), Some(s)) => (f, m, s),
            _ => return,
        };

        let push_allowed = self.gate.push_allowed();
        if let Some(alert) = self
            .engine
            .on_tick(fast, medium, slow, Utc::now(), push_allowed)
        {
            self.emitter.emit(alert);
        }
    }

    fn log_status(&self, budget: f64) {
        let director = self.engine.director();
        let trap = self.engine.trap_mode();
        let cooldown = self.engine.cooldown();

        info!("--- Status ---");
        info!(
            "Director: {} (bias {:+.2}){}",
            director.regime,
            director.bias_score,
            if director.inside_cloud { " [in cloud]" } else { "" }
        );
        match trap.kind {
            Some(kind) if trap.active => info!("Trap: {} (age {})", kind, trap.age),
            _ => debug!("Trap: inactive"),
        }
        if let Some(direction) = cooldown.last_direction {
            info!(
                "Cooldown: last {} | retest {}",
                direction, cooldown.retest_since_last
            );
        }
        info!("Alerts in history: {}", self.emitter.history().len());

        info!("Trade: {}", self.tracker.state());
        if let Some(signal) = self.tracker.signal() {
            let contracts = sizing::contracts_affordable(budget, signal.estimated_premium);
            info!(
                "  {} {} @ ${:.0} | premium ~${:.2} | {} contract(s)",
                signal.strength, signal.direction, signal.strike_price,
                signal.estimated_premium, contracts
            );
            for row in sizing::payout_table(signal, contracts) {
                info!("    {}: exit ${:.2} -> PnL ${:+.2}", row.label, row.exit_premium, row.pnl);
            }
            if let Some(elapsed) = self.tracker.elapsed(Utc::now()) {
                info!("  elapsed: {}s", elapsed.num_seconds());
            }
        }
    }

    fn shutdown(&self) {
        info!("Shutting down...");
        self.log_status(0.0);
        info!("Bot stopped.");
    }
}
