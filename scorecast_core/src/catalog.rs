//! Event catalog: what can happen on the field, what it is worth, and who
//! can make it happen.
//!
//! The catalog and the per-role fire probabilities are a single data set.
//! Both ship with defaults and both can be replaced wholesale from config.

use crate::roster::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of scoring occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Touchdown,
    FieldGoal,
    Interception,
    Fumble,
    BigPlay,
    Target,
    Carry,
    Sack,
    DefensiveTd,
}

impl EventKind {
    /// Returns the wire name (`"field_goal"`).
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Touchdown => "touchdown",
            EventKind::FieldGoal => "field_goal",
            EventKind::Interception => "interception",
            EventKind::Fumble => "fumble",
            EventKind::BigPlay => "big_play",
            EventKind::Target => "target",
            EventKind::Carry => "carry",
            EventKind::Sack => "sack",
            EventKind::DefensiveTd => "defensive_td",
        }
    }

    /// Returns the display label (`"field goal"`).
    pub fn label(&self) -> String {
        self.name().replace('_', " ")
    }

    /// Returns the verb phrase used when narrating the event.
    pub fn phrase(&self) -> &'static str {
        match self {
            EventKind::Touchdown => "just scored a touchdown",
            EventKind::FieldGoal => "kicked a field goal",
            EventKind::Interception => "threw an interception",
            EventKind::Fumble => "lost a fumble",
            EventKind::BigPlay => "made a big play",
            EventKind::Target => "was targeted",
            EventKind::Carry => "had a rushing attempt",
            EventKind::Sack => "recorded a sack",
            EventKind::DefensiveTd => "scored a defensive touchdown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub kind: EventKind,
    /// Points before noise; may be negative
    pub base_points: f64,
    pub eligible_roles: BTreeSet<Role>,
}

impl EventDefinition {
    pub fn new(kind: EventKind, base_points: f64, roles: &[Role]) -> Self {
        Self {
            kind,
            base_points,
            eligible_roles: roles.iter().copied().collect(),
        }
    }

    pub fn is_eligible(&self, role: Role) -> bool {
        self.eligible_roles.contains(&role)
    }
}

fn default_fire_probability() -> f64 {
    0.15
}

/// Immutable table of event kinds plus the per-role chance of firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCatalog {
    pub events: Vec<EventDefinition>,

    /// Chance that a cooled-down player fires an event on a given request
    pub fire_probabilities: BTreeMap<Role, f64>,

    /// Chance used for roles missing from `fire_probabilities`
    #[serde(default = "default_fire_probability")]
    pub default_fire_probability: f64,
}

impl EventCatalog {
    /// The standard football catalog.
    pub fn standard() -> Self {
        use EventKind::*;
        use Role::*;

        let events = vec![
            EventDefinition::new(Touchdown, 6.0, &[QB, RB, WR, TE]),
            EventDefinition::new(FieldGoal, 3.0, &[K]),
            EventDefinition::new(Interception, -2.0, &[QB]),
            EventDefinition::new(Fumble, -2.0, &[RB, WR]),
            EventDefinition::new(BigPlay, 2.0, &[QB, RB, WR, TE]),
            EventDefinition::new(Target, 1.0, &[WR, TE]),
            EventDefinition::new(Carry, 0.5, &[RB]),
            EventDefinition::new(Sack, 2.0, &[DEF]),
            EventDefinition::new(DefensiveTd, 6.0, &[DEF]),
        ];

        let fire_probabilities = BTreeMap::from([
            (QB, 0.30),
            (RB, 0.25),
            (WR, 0.20),
            (K, 0.15),
            (DEF, 0.20),
        ]);

        Self {
            events,
            fire_probabilities,
            default_fire_probability: default_fire_probability(),
        }
    }

    /// Returns every definition the role may trigger, in catalog order.
    ///
    /// An empty result means "no event possible" for that role.
    pub fn eligible_for(&self, role: Role) -> Vec<&EventDefinition> {
        self.events.iter().filter(|e| e.is_eligible(role)).collect()
    }

    /// Returns the chance that `role` fires an event once off cooldown.
    pub fn fire_probability(&self, role: Role) -> f64 {
        self.fire_probabilities
            .get(&role)
            .copied()
            .unwrap_or(self.default_fire_probability)
    }

    /// Checks the catalog is usable; returns a description of the first problem.
    pub fn check(&self) -> Result<(), String> {
        for event in &self.events {
            if event.eligible_roles.is_empty() {
                return Err(format!("event {} has no eligible role", event.kind));
            }
            if !event.base_points.is_finite() {
                return Err(format!("event {} has non-finite points", event.kind));
            }
        }

        let probabilities = self
            .fire_probabilities
            .iter()
            .map(|(role, p)| (role.tag(), *p))
            .chain(std::iter::once(("default", self.default_fire_probability)));
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("fire probability for {name} is {p}, outside [0, 1]"));
            }
        }

        Ok(())
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kicker_only_kicks() {
        let catalog = EventCatalog::standard();
        let kinds: Vec<EventKind> = catalog
            .eligible_for(Role::K)
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::FieldGoal]);
    }

    #[test]
    fn test_quarterback_events() {
        let catalog = EventCatalog::standard();
        let kinds: Vec<EventKind> = catalog
            .eligible_for(Role::QB)
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::Touchdown, EventKind::Interception, EventKind::BigPlay]
        );
    }

    #[test]
    fn test_role_without_events_yields_empty() {
        let catalog = EventCatalog {
            events: vec![EventDefinition::new(EventKind::Sack, 2.0, &[Role::DEF])],
            ..EventCatalog::standard()
        };
        assert!(catalog.eligible_for(Role::K).is_empty());
    }

    #[test]
    fn test_fire_probabilities() {
        let catalog = EventCatalog::standard();
        assert_eq!(catalog.fire_probability(Role::QB), 0.30);
        assert_eq!(catalog.fire_probability(Role::RB), 0.25);
        assert_eq!(catalog.fire_probability(Role::WR), 0.20);
        assert_eq!(catalog.fire_probability(Role::K), 0.15);
        assert_eq!(catalog.fire_probability(Role::DEF), 0.20);
        // TE has no entry and falls back to the default
        assert_eq!(catalog.fire_probability(Role::TE), 0.15);
    }

    #[test]
    fn test_check_rejects_bad_probability() {
        let mut catalog = EventCatalog::standard();
        assert!(catalog.check().is_ok());

        catalog.fire_probabilities.insert(Role::WR, 1.5);
        assert!(catalog.check().is_err());
    }

    #[test]
    fn test_check_rejects_roleless_event() {
        let mut catalog = EventCatalog::standard();
        catalog.events.push(EventDefinition::new(EventKind::Carry, 0.5, &[]));
        assert!(catalog.check().is_err());
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = serde_json::to_value(EventCatalog::standard()).unwrap();
        assert_eq!(json["events"][1]["kind"], "field_goal");
        assert_eq!(json["events"][1]["eligibleRoles"][0], "K");
        assert_eq!(json["fireProbabilities"]["QB"], 0.30);
    }

    #[test]
    fn test_labels() {
        assert_eq!(EventKind::DefensiveTd.label(), "defensive td");
        assert_eq!(EventKind::FieldGoal.phrase(), "kicked a field goal");
    }
}
