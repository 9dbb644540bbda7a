//! SimulationService - the single owner of all shared feed state.
//!
//! Constructed once at startup and handed by reference to every request
//! handler and to the clock task; there are no ambient globals.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   SimulationService<C>                   │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │ Context: FeedContext (clock, sleep, uniform draws) │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │  ┌──────────┐ ┌─────────────┐ ┌────────────┐ ┌────────┐  │
//! │  │  Roster  │ │ EntityStore │ │ MatchClock │ │Narrator│  │
//! │  └──────────┘ └─────────────┘ └────────────┘ └────────┘  │
//! │                 ▲       EventSimulator (stateless)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Lock order is always phase before store (see [`SimulationService::restart_game`]).

use crate::catalog::EventCatalog;
use crate::clock::{MatchClock, MatchPhase, TickOutcome};
use crate::config::FeedConfig;
use crate::error::ConfigError;
use crate::narrative::{NarrativeGenerator, OfflineNarrator};
use crate::roster::{Player, Roster};
use crate::simulator::EventSimulator;
use crate::store::EntityStore;
use scorecast_env::FeedContext;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The feed engine.
///
/// Generic over the context so the same service runs against production
/// time and entropy or a deterministic simulation context.
pub struct SimulationService<C: FeedContext> {
    ctx: Arc<C>,
    roster: Roster,
    store: EntityStore,
    clock: MatchClock,
    simulator: EventSimulator,
    narrator: Arc<dyn NarrativeGenerator>,
    fallback_score_range: (i64, i64),
    narrative_timeout: Duration,
}

impl<C: FeedContext> SimulationService<C> {
    /// Builds the service at kickoff with no narrative service attached.
    ///
    /// The config is validated first, so a service is never built over an
    /// empty roster, duplicate ids or out-of-range tuning values.
    pub fn new(ctx: Arc<C>, config: FeedConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let roster = Roster::new(config.roster);
        let store = EntityStore::new(&roster, ctx.now_ms());
        let clock = MatchClock::new(config.clock);
        let simulator = EventSimulator::new(Arc::new(config.catalog))
            .with_cooldown_ms(config.cooldown_ms)
            .with_noise_amplitude(config.noise_amplitude);

        info!(
            players = roster.len(),
            seed = ctx.seed(),
            cooldown_ms = simulator.cooldown_ms(),
            "Simulation service ready"
        );

        Ok(Self {
            ctx,
            roster,
            store,
            clock,
            simulator,
            narrator: Arc::new(OfflineNarrator),
            fallback_score_range: config.fallback_score_range,
            narrative_timeout: Duration::from_millis(config.narrative_timeout_ms),
        })
    }

    /// Attaches a narrative service.
    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Replaces the clock, e.g. to start from a specific phase.
    pub fn with_clock(mut self, clock: MatchClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    pub fn simulator(&self) -> &EventSimulator {
        &self.simulator
    }

    pub fn catalog(&self) -> &EventCatalog {
        self.simulator.catalog()
    }

    pub fn narrator(&self) -> &dyn NarrativeGenerator {
        self.narrator.as_ref()
    }

    pub fn fallback_score_range(&self) -> (i64, i64) {
        self.fallback_score_range
    }

    pub fn narrative_timeout(&self) -> Duration {
        self.narrative_timeout
    }

    /// Current match phase.
    pub fn game_status(&self) -> MatchPhase {
        self.clock.snapshot()
    }

    /// Flips the simulation flag; returns the new value.
    pub fn toggle_simulation(&self) -> bool {
        self.clock.toggle_simulation()
    }

    /// Restarts the match and resets every player, as one indivisible step.
    pub fn restart_game(&self) -> MatchPhase {
        let now_ms = self.ctx.now_ms();
        self.clock
            .restart(|| self.store.reset_all(&self.roster, now_ms))
    }

    /// Runs one clock tick.
    pub fn tick(&self) -> TickOutcome {
        self.clock.tick(self.ctx.as_ref())
    }

    /// Ticks the clock every `tick_interval_ms` until `shutdown` turns true
    /// or its sender is dropped.
    ///
    /// A tick that panics is logged and the loop carries on.
    pub async fn run_clock(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_millis(self.clock.rules().tick_interval_ms);
        info!(interval_ms = interval.as_millis() as u64, "Match clock started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = self.ctx.sleep(interval) => {}
            }

            match std::panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(TickOutcome::Idle) => debug!("Clock idle"),
                Ok(outcome) => debug!(?outcome, "Clock ticked"),
                Err(_) => warn!("Clock tick failed; retrying next interval"),
            }
        }

        info!("Match clock stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventKind;
    use crate::clock::{ClockRules, FINAL_QUARTER, FINAL_WHISTLE_LABEL, QUARTER_START_LABEL};
    use crate::roster::{Player, Role};
    use crate::store::EventRecord;
    use crate::test_support::ScriptedContext;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn service() -> (Arc<ScriptedContext>, Arc<SimulationService<ScriptedContext>>) {
        let ctx = Arc::new(ScriptedContext::new(11));
        let svc = SimulationService::new(Arc::clone(&ctx), FeedConfig::default()).unwrap();
        let svc = Arc::new(svc);
        (ctx, svc)
    }

    fn fast_clock() -> ClockRules {
        ClockRules {
            quarter_advance_probability: 1.0,
            match_end_probability: 1.0,
            ..ClockRules::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let ctx = Arc::new(ScriptedContext::new(11));

        let mut duplicated = FeedConfig::default();
        duplicated
            .roster
            .push(Player::new(1, "Copy", Role::QB, "BUF", 10.0));
        assert!(SimulationService::new(Arc::clone(&ctx), duplicated).is_err());

        let noisy = FeedConfig {
            noise_amplitude: -1.0,
            ..FeedConfig::default()
        };
        assert!(SimulationService::new(Arc::clone(&ctx), noisy).is_err());

        let inverted = FeedConfig {
            fallback_score_range: (29, 5),
            ..FeedConfig::default()
        };
        assert!(SimulationService::new(Arc::clone(&ctx), inverted).is_err());

        let empty = FeedConfig {
            roster: Vec::new(),
            ..FeedConfig::default()
        };
        assert!(SimulationService::new(ctx, empty).is_err());
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        let (_, svc) = service();
        let original = svc.game_status().simulation_enabled;
        svc.toggle_simulation();
        svc.toggle_simulation();
        assert_eq!(svc.game_status().simulation_enabled, original);
    }

    #[test]
    fn test_restart_resets_phase_and_players() {
        let ctx = Arc::new(ScriptedContext::new(11));
        let svc = SimulationService::new(Arc::clone(&ctx), FeedConfig::default())
            .unwrap()
            .with_clock(MatchClock::new(fast_clock()));

        for player in svc.players() {
            svc.store()
                .mutate(player.id, |s| {
                    s.apply_event(EventRecord {
                        kind: EventKind::Touchdown,
                        points_applied: 6.3,
                        at_ms: 40_000,
                    })
                })
                .unwrap();
        }

        for _ in 0..4 {
            svc.tick();
        }
        assert!(!svc.game_status().in_progress);

        ctx.advance_ms(90_000);
        let phase = svc.restart_game();
        assert_eq!(phase.quarter, 1);
        assert_eq!(phase.time_remaining_label, QUARTER_START_LABEL);
        assert!(phase.in_progress);
        assert_eq!(svc.game_status(), phase);

        for player in svc.players() {
            let state = svc.store().get(player.id).unwrap();
            assert_eq!(state.current_score, player.base_points);
            assert!(state.recent_events.is_empty());
            assert_eq!(state.last_event_at_ms, 90_000);
        }
    }

    #[test]
    fn test_restart_keeps_simulation_flag() {
        let (_, svc) = service();
        assert!(!svc.toggle_simulation());

        let phase = svc.restart_game();
        assert!(!phase.simulation_enabled);
        assert!(!phase.is_live());
    }

    #[tokio::test]
    async fn test_clock_task_stops_on_shutdown() {
        let (ctx, svc) = service();
        let (tx, rx) = watch::channel(false);

        let runner = Arc::clone(&svc);
        let handle = tokio::spawn(async move { runner.run_clock(rx).await });

        while ctx.now() < Duration::from_secs(60 * 30) {
            tokio::task::yield_now().await;
        }

        tx.send(true).unwrap();
        handle.await.unwrap();

        let phase = svc.game_status();
        assert!(phase.quarter >= 1 && phase.quarter <= FINAL_QUARTER);
    }

    #[tokio::test]
    async fn test_clock_task_stops_when_sender_dropped() {
        let (_, svc) = service();
        let (tx, rx) = watch::channel(false);

        let runner = Arc::clone(&svc);
        let handle = tokio::spawn(async move { runner.run_clock(rx).await });

        tokio::task::yield_now().await;
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_clock_task_does_not_start_when_already_shut_down() {
        let (ctx, svc) = service();
        let (_tx, rx) = watch::channel(true);

        svc.run_clock(rx).await;
        assert_eq!(ctx.now(), Duration::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_restart_races_ticks_and_toggles() {
        let ctx = Arc::new(ScriptedContext::new(23));
        let svc = Arc::new(
            SimulationService::new(Arc::clone(&ctx), FeedConfig::default())
                .unwrap()
                .with_clock(MatchClock::new(fast_clock())),
        );
        let done = Arc::new(AtomicBool::new(false));

        let ticker = {
            let svc = Arc::clone(&svc);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                while !done.load(Ordering::SeqCst) {
                    svc.tick();
                    tokio::task::yield_now().await;
                }
            })
        };
        let toggler = {
            let svc = Arc::clone(&svc);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                while !done.load(Ordering::SeqCst) {
                    svc.toggle_simulation();
                    tokio::task::yield_now().await;
                }
            })
        };
        let observer = {
            let svc = Arc::clone(&svc);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                while !done.load(Ordering::SeqCst) {
                    let phase = svc.game_status();
                    assert!((1..=FINAL_QUARTER).contains(&phase.quarter));
                    if phase.in_progress {
                        assert_eq!(phase.time_remaining_label, QUARTER_START_LABEL);
                    } else {
                        assert_eq!(phase.quarter, FINAL_QUARTER);
                        assert_eq!(phase.time_remaining_label, FINAL_WHISTLE_LABEL);
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        for round in 1..=200u64 {
            ctx.advance_ms(1_000);
            let phase = svc.restart_game();
            assert_eq!(phase.quarter, 1, "round {round}");
            assert_eq!(phase.time_remaining_label, QUARTER_START_LABEL);
            assert!(phase.in_progress);
            tokio::task::yield_now().await;
        }

        done.store(true, Ordering::SeqCst);
        ticker.await.unwrap();
        toggler.await.unwrap();
        observer.await.unwrap();

        let phase = svc.game_status();
        assert!((1..=FINAL_QUARTER).contains(&phase.quarter));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clock_task_survives_a_panicking_tick() {
        let ctx = Arc::new(ScriptedContext::new(11));
        let svc = Arc::new(
            SimulationService::new(Arc::clone(&ctx), FeedConfig::default())
                .unwrap()
                .with_clock(MatchClock::new(fast_clock())),
        );
        ctx.fail_next_draw();
        let (tx, rx) = watch::channel(false);

        let runner = Arc::clone(&svc);
        let handle = tokio::spawn(async move { runner.run_clock(rx).await });

        let finished = tokio::time::timeout(Duration::from_secs(10), async {
            while svc.game_status().in_progress {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(finished.is_ok(), "clock stopped ticking after a panic");

        tx.send(true).unwrap();
        handle.await.unwrap();

        let phase = svc.game_status();
        assert_eq!(phase.quarter, FINAL_QUARTER);
        assert_eq!(phase.time_remaining_label, FINAL_WHISTLE_LABEL);
        // The failed tick took no draws; three advances, then advance plus whistle
        assert_eq!(ctx.draws_taken(), 5);
    }
}
