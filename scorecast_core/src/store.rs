//! Per-player simulation state and the concurrency-safe store that owns it.
//!
//! # Locking
//!
//! ```text
//! RwLock<HashMap<PlayerId, Mutex<EntityState>>>
//!   read side  + one entry mutex  -> get / mutate   (players never contend)
//!   write side                    -> reset_all      (atomic across the roster)
//! ```
//!
//! The roster is fixed at startup, so the map itself never changes shape;
//! the write side exists only to make the wholesale reset indivisible.

use crate::catalog::EventKind;
use crate::error::FeedError;
use crate::roster::{Player, PlayerId, Role, Roster};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError, RwLock};

/// Number of events kept in a player's history.
pub const RECENT_EVENT_CAPACITY: usize = 3;

/// Whether a player is currently contributing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityStatus::Active => write!(f, "Active"),
            EntityStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// An event that has been applied to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub kind: EventKind,
    pub points_applied: f64,
    /// Monotonic context time, in milliseconds
    pub at_ms: u64,
}

/// Mutable simulation state of one roster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    pub player_id: PlayerId,
    pub role: Role,
    pub current_score: f64,
    pub last_event_at_ms: u64,
    pub status: EntityStatus,
    /// Most recent first, never longer than [`RECENT_EVENT_CAPACITY`]
    pub recent_events: VecDeque<EventRecord>,
}

impl EntityState {
    /// State at kickoff: base score, empty history, cooldown starting now.
    pub fn fresh(player: &Player, now_ms: u64) -> Self {
        Self {
            player_id: player.id,
            role: player.role,
            current_score: player.base_points,
            last_event_at_ms: now_ms,
            status: EntityStatus::Active,
            recent_events: VecDeque::with_capacity(RECENT_EVENT_CAPACITY),
        }
    }

    /// Applies an event: adds its points, restarts the cooldown and pushes it
    /// to the front of the history, evicting the oldest entry on overflow.
    ///
    /// `last_event_at_ms` never moves backwards.
    pub fn apply_event(&mut self, record: EventRecord) {
        self.current_score += record.points_applied;
        self.last_event_at_ms = self.last_event_at_ms.max(record.at_ms);
        self.recent_events.push_front(record);
        self.recent_events.truncate(RECENT_EVENT_CAPACITY);
    }

    /// Restores the kickoff state for `base_points`.
    pub fn reset(&mut self, base_points: f64, now_ms: u64) {
        self.current_score = base_points;
        self.last_event_at_ms = self.last_event_at_ms.max(now_ms);
        self.status = EntityStatus::Active;
        self.recent_events.clear();
    }

    /// Milliseconds since the last event (or reset), saturating at zero.
    pub fn elapsed_since_event(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_event_at_ms)
    }
}

/// Exclusive owner of every [`EntityState`].
#[derive(Debug)]
pub struct EntityStore {
    entries: RwLock<HashMap<PlayerId, Mutex<EntityState>>>,
}

impl EntityStore {
    /// Seeds one fresh state per roster member.
    pub fn new(roster: &Roster, now_ms: u64) -> Self {
        let entries = roster
            .players()
            .iter()
            .map(|p| (p.id, Mutex::new(EntityState::fresh(p, now_ms))))
            .collect();

        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns a point-in-time snapshot of one player's state.
    pub fn get(&self, id: PlayerId) -> Result<EntityState, FeedError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&id).ok_or(FeedError::PlayerNotFound(id))?;
        let state = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.clone())
    }

    /// Runs `transform` on the stored state while holding the player's lock
    /// and returns the post-transform snapshot together with its output.
    ///
    /// Transforms on the same player are serialized; transforms on different
    /// players run in parallel.
    pub fn mutate<R>(
        &self,
        id: PlayerId,
        transform: impl FnOnce(&mut EntityState) -> R,
    ) -> Result<(EntityState, R), FeedError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&id).ok_or(FeedError::PlayerNotFound(id))?;
        let mut state = entry.lock().unwrap_or_else(PoisonError::into_inner);
        let output = transform(&mut state);
        Ok((state.clone(), output))
    }

    /// Restores every player to its roster base score with empty history.
    ///
    /// Holds the write side for the whole pass, so no reader can observe a
    /// roster that is only partly reset.
    pub fn reset_all(&self, roster: &Roster, now_ms: u64) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        for player in roster.players() {
            let state = entries
                .entry(player.id)
                .or_insert_with(|| Mutex::new(EntityState::fresh(player, now_ms)));
            state
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .reset(player.base_points, now_ms);
        }
    }

    /// Snapshots every player, ordered by id.
    pub fn snapshot_all(&self) -> Vec<EntityState> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut states: Vec<EntityState> = entries
            .values()
            .map(|e| e.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        states.sort_by_key(|s| s.player_id);
        states
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
