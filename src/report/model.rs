//! Report shape returned by the combat simulation service (`GET /combat/report`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::action::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub health: f64,
}

/// One recorded event: actor, free-text action and the health snapshot after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub turn: u32,
    pub character: String,
    pub action: String,
    #[serde(default)]
    pub healths: BTreeMap<String, f64>,
    /// Structured classification when the service provides one; takes precedence over `action`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Result of one simulation run. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    pub total_turns: u32,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterState>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub damage_dealt: BTreeMap<String, f64>,
    #[serde(default)]
    pub healing_done: BTreeMap<String, f64>,
    #[serde(default)]
    pub spells_cast: BTreeMap<String, f64>,
    /// Not sent by the service today; honoured when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health: Option<f64>,
}

impl Report {
    /// Final health per character.
    ///
    /// The last timeline snapshot is authoritative; `characters[name].health` is only
    /// used when the timeline is empty or its last entry carries no snapshot.
    pub fn final_healths(&self) -> BTreeMap<String, f64> {
        match self.timeline.last() {
            Some(last) if !last.healths.is_empty() => last.healths.clone(),
            _ => self
                .characters
                .iter()
                .map(|(name, state)| (name.clone(), state.health))
                .collect(),
        }
    }

    /// Health snapshot after the entry at `index`, clamped to the last entry.
    pub fn healths_at(&self, index: usize) -> BTreeMap<String, f64> {
        if self.timeline.is_empty() {
            return self.final_healths();
        }
        let index = index.min(self.timeline.len() - 1);
        self.timeline[index].healths.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.timeline.len()
    }

    /// Every character name mentioned anywhere in the report, in name order.
    pub fn character_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .characters
            .keys()
            .chain(self.damage_dealt.keys())
            .chain(self.healing_done.keys())
            .chain(self.spells_cast.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
