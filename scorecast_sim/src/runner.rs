//! Scenario runner - executes deterministic feed scenarios.

use crate::context::SimContext;
use crate::scenarios::ScenarioId;

use scorecast_core::clock::{FINAL_QUARTER, FINAL_WHISTLE_LABEL, QUARTER_START_LABEL};
use scorecast_core::{
    ConfigError, FeedConfig, MatchClock, MatchPhase, PlayerId, SimulationService, TickOutcome,
};
use scorecast_env::FeedContext;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Virtual length of a polled match.
const MATCH_LENGTH_SECS: u64 = 60 * 60;

/// Hard stop for `full_match`; the expected length is well under 100 ticks.
const MAX_MATCH_TICKS: u64 = 10_000;

/// Independent Q4 trials in `endgame_odds`.
const ENDGAME_TRIALS: u64 = 20_000;

/// Allowed gap between observed and expected end rate, in standard errors.
const ENDGAME_SIGMAS: f64 = 5.0;

/// Tolerance floor for end rates at or near 0 and 1.
const ENDGAME_MIN_TOLERANCE: f64 = 0.002;

/// Binomial tolerance for an end rate of `expected` over `ENDGAME_TRIALS`.
fn endgame_tolerance(expected: f64) -> f64 {
    let variance = expected * (1.0 - expected) / ENDGAME_TRIALS as f64;
    (ENDGAME_SIGMAS * variance.max(0.0).sqrt()).max(ENDGAME_MIN_TOLERANCE)
}

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total clock ticks executed
    pub total_ticks: u64,

    /// Final virtual time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Stats queries served
    pub queries: u64,

    /// Scoring events applied
    pub events_fired: u64,

    /// Quarter transitions observed
    pub quarter_advances: u64,

    /// Final whistles observed
    pub matches_ended: u64,
}

/// Collects invariant violations; a scenario passes when none were recorded.
#[derive(Default)]
struct Checks {
    violations: Vec<String>,
}

impl Checks {
    fn ensure(&mut self, condition: bool, describe: impl FnOnce() -> String) {
        if !condition {
            self.violations.push(describe());
        }
    }

    fn failure(&self) -> Option<String> {
        match self.violations.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            [first, rest @ ..] => Some(format!("{} (+{} more)", first, rest.len())),
        }
    }
}

/// Runs feed scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Feed configuration every scenario starts from
    config: FeedConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner over the default feed configuration.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: FeedConfig::default(),
        }
    }

    /// Sets the feed configuration.
    pub fn with_config(mut self, config: FeedConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let ctx = SimContext::shared(self.seed);
        let service = match SimulationService::new(Arc::clone(&ctx), self.config.clone()) {
            Ok(service) => service,
            Err(e) => return self.rejected(scenario, &ctx, e),
        };

        match scenario {
            ScenarioId::CooldownStorm => self.run_cooldown_storm(ctx, service).await,
            ScenarioId::FullMatch => self.run_full_match(ctx, service),
            ScenarioId::PausedFeed => self.run_paused_feed(ctx, service).await,
            ScenarioId::EndgameOdds => self.run_endgame_odds(&ctx),
            ScenarioId::RestartMidGame => self.run_restart_mid_game(ctx, service).await,
        }
    }

    fn rejected(&self, scenario: ScenarioId, ctx: &SimContext, e: ConfigError) -> ScenarioResult {
        warn!(error = %e, "Scenario config rejected");
        let mut checks = Checks::default();
        checks.ensure(false, || e.to_string());
        self.result(scenario, ctx, 0, checks, ScenarioMetrics::default())
    }

    fn result(
        &self,
        scenario: ScenarioId,
        ctx: &SimContext,
        total_ticks: u64,
        checks: Checks,
        metrics: ScenarioMetrics,
    ) -> ScenarioResult {
        let failure_reason = checks.failure();
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            total_ticks,
            final_time_secs: ctx.now().as_secs_f64(),
            failure_reason,
            metrics,
        }
    }

    /// DST-001: CooldownStorm - hammer every player once per virtual second.
    ///
    /// **Assertion**: no player fires twice within the cooldown, history
    /// never exceeds 3 and every delta stays within noise of its base.
    async fn run_cooldown_storm(
        &self,
        ctx: Arc<SimContext>,
        service: SimulationService<SimContext>,
    ) -> ScenarioResult {
        info!("DST-001: CooldownStorm - polling every player each second");

        let cooldown_ms = service.simulator().cooldown_ms();
        let noise = service.simulator().noise_amplitude();
        let ids: Vec<PlayerId> = service.players().iter().map(|p| p.id).collect();

        let mut checks = Checks::default();
        let mut metrics = ScenarioMetrics::default();
        let mut last_fired: HashMap<PlayerId, u64> = HashMap::new();

        for second in 0..MATCH_LENGTH_SECS {
            ctx.advance_time(Duration::from_secs(1));

            for &id in &ids {
                let before = service.store().get(id).map(|s| s.current_score);
                let report = match service.query_stats(id).await {
                    Ok(report) => report,
                    Err(e) => {
                        checks.ensure(false, || format!("query for {} failed: {}", id, e));
                        continue;
                    }
                };
                metrics.queries += 1;

                checks.ensure(report.recent_events.len() <= 3, || {
                    format!("player {} history holds {} events", id, report.recent_events.len())
                });

                let Some(event) = report.recent_event else {
                    continue;
                };
                metrics.events_fired += 1;
                let now_ms = ctx.now_ms();

                if let Some(previous) = last_fired.insert(id, now_ms) {
                    checks.ensure(now_ms - previous >= cooldown_ms, || {
                        format!("player {} fired {}ms after its last event", id, now_ms - previous)
                    });
                }
                checks.ensure((event.delta - event.base_points).abs() <= noise, || {
                    format!("delta {:.3} outside {} +/- {}", event.delta, event.base_points, noise)
                });
                if let Ok(before) = before {
                    checks.ensure(
                        (report.stats.score - (before + event.delta)).abs() < 1e-9,
                        || format!("player {} score did not move by its delta", id),
                    );
                }
            }

            if second % 600 == 0 {
                debug!("  t={}s | events={}", second, metrics.events_fired);
            }
        }

        checks.ensure(metrics.events_fired > 0, || "no events fired".to_string());

        info!(
            queries = metrics.queries,
            events = metrics.events_fired,
            "CooldownStorm complete"
        );
        self.result(ScenarioId::CooldownStorm, &ctx, 0, checks, metrics)
    }

    /// DST-002: FullMatch - tick every virtual minute until the whistle.
    ///
    /// **Assertion**: quarters never decrease or pass 4, and the match only
    /// ends from Q4 with "0:00".
    fn run_full_match(
        &self,
        ctx: Arc<SimContext>,
        service: SimulationService<SimContext>,
    ) -> ScenarioResult {
        info!("DST-002: FullMatch - ticking to the final whistle");

        let interval = Duration::from_millis(service.clock().rules().tick_interval_ms);

        let mut checks = Checks::default();
        let mut metrics = ScenarioMetrics::default();
        let mut previous = service.game_status();
        let mut ticks = 0;

        while previous.in_progress && ticks < MAX_MATCH_TICKS {
            ctx.advance_time(interval);
            let outcome = service.tick();
            let phase = service.game_status();
            ticks += 1;

            checks.ensure(phase.quarter >= previous.quarter, || {
                format!("quarter went from {} to {}", previous.quarter, phase.quarter)
            });
            checks.ensure(phase.quarter <= FINAL_QUARTER, || {
                format!("quarter {} past the final quarter", phase.quarter)
            });

            match outcome {
                TickOutcome::QuarterAdvanced(q) => {
                    metrics.quarter_advances += 1;
                    checks.ensure(
                        q == previous.quarter + 1 && phase.time_remaining_label == QUARTER_START_LABEL,
                        || format!("bad advance from Q{} to Q{}", previous.quarter, q),
                    );
                }
                TickOutcome::MatchEnded => {
                    metrics.matches_ended += 1;
                    checks.ensure(previous.quarter == FINAL_QUARTER, || {
                        format!("match ended from Q{}", previous.quarter)
                    });
                    checks.ensure(phase.time_remaining_label == FINAL_WHISTLE_LABEL, || {
                        format!("match ended at {}", phase.time_remaining_label)
                    });
                }
                TickOutcome::Unchanged => checks.ensure(phase == previous, || {
                    "unchanged tick moved the phase".to_string()
                }),
                TickOutcome::Idle => checks.ensure(false, || "live clock reported idle".to_string()),
            }

            previous = phase;
        }

        checks.ensure(!previous.in_progress, || {
            format!("match still running after {} ticks", ticks)
        });

        info!(ticks, quarters = metrics.quarter_advances, "FullMatch complete");
        self.result(ScenarioId::FullMatch, &ctx, ticks, checks, metrics)
    }

    /// DST-003: PausedFeed - simulation disabled for a whole match.
    ///
    /// **Assertion**: no events, ticks leave the phase alone, reported scores
    /// are integers inside the fallback range, stored scores stay at base.
    async fn run_paused_feed(
        &self,
        ctx: Arc<SimContext>,
        service: SimulationService<SimContext>,
    ) -> ScenarioResult {
        info!("DST-003: PausedFeed - simulation disabled");

        service.toggle_simulation();
        let interval = Duration::from_millis(service.clock().rules().tick_interval_ms);
        let (low, high) = service.fallback_score_range();
        let frozen = service.game_status();

        let mut checks = Checks::default();
        let mut metrics = ScenarioMetrics::default();
        let minutes = MATCH_LENGTH_SECS / 60;

        for _ in 0..minutes {
            ctx.advance_time(interval);
            let outcome = service.tick();
            checks.ensure(outcome == TickOutcome::Idle, || {
                format!("paused clock ticked: {:?}", outcome)
            });
            checks.ensure(service.game_status() == frozen, || {
                "paused clock changed the phase".to_string()
            });

            for player in service.players() {
                let Ok(report) = service.query_stats(player.id).await else {
                    checks.ensure(false, || format!("query for {} failed", player.id));
                    continue;
                };
                metrics.queries += 1;

                let score = report.stats.score;
                checks.ensure(report.recent_event.is_none(), || {
                    format!("player {} fired while paused", player.id)
                });
                checks.ensure(
                    score >= low as f64 && score <= high as f64 && score.fract() == 0.0,
                    || format!("fallback score {} outside [{}, {}]", score, low, high),
                );
            }
        }

        for state in service.store().snapshot_all() {
            let base = service
                .roster()
                .get(state.player_id)
                .map(|p| p.base_points)
                .unwrap_or_default();
            checks.ensure(state.current_score == base && state.recent_events.is_empty(), || {
                format!("player {} moved while paused", state.player_id)
            });
        }

        info!(queries = metrics.queries, "PausedFeed complete");
        self.result(ScenarioId::PausedFeed, &ctx, minutes, checks, metrics)
    }

    /// DST-004: EndgameOdds - independent ticks from the start of Q4.
    ///
    /// **Assertion**: observed end rate within five binomial standard errors
    /// of `quarter_advance_probability * match_end_probability`.
    fn run_endgame_odds(&self, ctx: &SimContext) -> ScenarioResult {
        info!("DST-004: EndgameOdds - {} final-quarter trials", ENDGAME_TRIALS);

        let rules = self.config.clock.clone();
        let expected = rules.quarter_advance_probability * rules.match_end_probability;

        let mut checks = Checks::default();
        let mut metrics = ScenarioMetrics::default();

        for _ in 0..ENDGAME_TRIALS {
            let clock = MatchClock::with_phase(
                rules.clone(),
                MatchPhase {
                    quarter: FINAL_QUARTER,
                    ..MatchPhase::kickoff()
                },
            );
            match clock.tick(ctx) {
                TickOutcome::MatchEnded => metrics.matches_ended += 1,
                TickOutcome::Unchanged => {}
                other => checks.ensure(false, || format!("Q4 tick produced {:?}", other)),
            }
        }

        let observed = metrics.matches_ended as f64 / ENDGAME_TRIALS as f64;
        let tolerance = endgame_tolerance(expected);
        checks.ensure((observed - expected).abs() <= tolerance, || {
            format!(
                "end rate {:.4}, expected {:.4} +/- {:.4}",
                observed, expected, tolerance
            )
        });

        info!(observed, expected, tolerance, "EndgameOdds complete");
        self.result(ScenarioId::EndgameOdds, ctx, ENDGAME_TRIALS, checks, metrics)
    }

    /// DST-005: RestartMidGame - play for a while, then restart.
    ///
    /// **Assertion**: Q1 / "15:00" / in progress afterwards, every player at
    /// base with empty history and a fresh cooldown.
    async fn run_restart_mid_game(
        &self,
        ctx: Arc<SimContext>,
        service: SimulationService<SimContext>,
    ) -> ScenarioResult {
        info!("DST-005: RestartMidGame - restart after play");

        let interval = Duration::from_millis(service.clock().rules().tick_interval_ms);
        let ids: Vec<PlayerId> = service.players().iter().map(|p| p.id).collect();

        let mut checks = Checks::default();
        let mut metrics = ScenarioMetrics::default();
        let mut ticks = 0;

        for _ in 0..30 {
            ctx.advance_time(interval);
            if let TickOutcome::QuarterAdvanced(_) = service.tick() {
                metrics.quarter_advances += 1;
            }
            ticks += 1;

            for &id in &ids {
                if let Ok(report) = service.query_stats(id).await {
                    metrics.queries += 1;
                    if report.recent_event.is_some() {
                        metrics.events_fired += 1;
                    }
                }
            }
        }

        let phase = service.restart_game();
        checks.ensure(
            phase.quarter == 1
                && phase.time_remaining_label == QUARTER_START_LABEL
                && phase.in_progress,
            || format!("restart produced {:?}", phase),
        );

        for player in service.players() {
            match service.store().get(player.id) {
                Ok(state) => checks.ensure(
                    state.current_score == player.base_points && state.recent_events.is_empty(),
                    || format!("player {} not reset", player.id),
                ),
                Err(e) => checks.ensure(false, || e.to_string()),
            }
        }

        // Cooldown restarts with the match
        for &id in &ids {
            if let Ok(report) = service.query_stats(id).await {
                checks.ensure(report.recent_event.is_none(), || {
                    format!("player {} fired straight after restart", id)
                });
            }
        }

        info!(events = metrics.events_fired, "RestartMidGame complete");
        self.result(ScenarioId::RestartMidGame, &ctx, ticks, checks, metrics)
    }
}
