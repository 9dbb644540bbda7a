//! Roster of tracked players and their roles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Position a player lines up at; gates which events they can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
}

impl Role {
    /// Returns every role.
    pub fn all() -> [Role; 6] {
        [Role::QB, Role::RB, Role::WR, Role::TE, Role::K, Role::DEF]
    }

    /// Returns the short tag ("QB", "K", ...).
    pub fn tag(&self) -> &'static str {
        match self {
            Role::QB => "QB",
            Role::RB => "RB",
            Role::WR => "WR",
            Role::TE => "TE",
            Role::K => "K",
            Role::DEF => "DEF",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "QB" => Ok(Role::QB),
            "RB" => Ok(Role::RB),
            "WR" => Ok(Role::WR),
            "TE" => Ok(Role::TE),
            "K" => Ok(Role::K),
            "DEF" | "DST" => Ok(Role::DEF),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Static descriptor of a roster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub team: String,
    /// Score the player starts (and restarts) the match with
    pub base_points: f64,
}

impl Player {
    pub fn new(id: u32, name: &str, role: Role, team: &str, base_points: f64) -> Self {
        Self {
            id: PlayerId(id),
            name: name.to_string(),
            role,
            team: team.to_string(),
            base_points,
        }
    }
}

/// Fixed, ordered set of players known to the feed.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

impl Roster {
    /// Builds a roster, keeping the first entry for any repeated id.
    pub fn new(players: Vec<Player>) -> Self {
        let mut kept = Vec::with_capacity(players.len());
        let mut index = HashMap::new();

        for player in players {
            if index.contains_key(&player.id) {
                continue;
            }
            index.insert(player.id, kept.len());
            kept.push(player);
        }

        Self {
            players: kept,
            index,
        }
    }

    /// The ten-player demo roster the feed ships with.
    pub fn standard() -> Self {
        Self::new(standard_players())
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

pub(crate) fn standard_players() -> Vec<Player> {
    vec![
        Player::new(1, "Josh Allen", Role::QB, "BUF", 18.0),
        Player::new(2, "Patrick Mahomes", Role::QB, "KC", 22.0),
        Player::new(3, "Lamar Jackson", Role::QB, "BAL", 20.0),
        Player::new(4, "Christian McCaffrey", Role::RB, "SF", 15.0),
        Player::new(5, "Derrick Henry", Role::RB, "TEN", 12.0),
        Player::new(6, "Cooper Kupp", Role::WR, "LAR", 14.0),
        Player::new(7, "Davante Adams", Role::WR, "LV", 13.0),
        Player::new(8, "Travis Kelce", Role::TE, "KC", 11.0),
        Player::new(9, "Justin Tucker", Role::K, "BAL", 8.0),
        Player::new(10, "Buffalo Bills", Role::DEF, "BUF", 10.0),
    ]
}
