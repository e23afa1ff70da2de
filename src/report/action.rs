//! Damage/heal classification of timeline entries.
//!
//! The service describes actions in prose ("Dealt 42 damage"). When an entry carries a
//! structured `kind` it wins; otherwise the text is scanned for the words `damage` and
//! `heal` and for the first embedded number.

use serde::{Deserialize, Serialize};

use crate::report::model::TimelineEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Damage,
    Heal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified {
    pub kind: ActionKind,
    pub amount: Option<f64>,
}

pub fn classify(entry: &TimelineEntry) -> Classified {
    let kind = entry
        .kind
        .unwrap_or_else(|| classify_text(&entry.action));
    let amount = entry.amount.or_else(|| embedded_amount(&entry.action));
    Classified { kind, amount }
}

/// Substring match, case-sensitive. "damage" wins over "heal" when both appear.
pub fn classify_text(action: &str) -> ActionKind {
    if action.contains("damage") {
        ActionKind::Damage
    } else if action.contains("heal") {
        ActionKind::Heal
    } else {
        ActionKind::Other
    }
}

/// First unsigned decimal number in the text, e.g. `42` in "Dealt 42 damage".
pub fn embedded_amount(action: &str) -> Option<f64> {
    let start = action.find(|c: char| c.is_ascii_digit())?;
    let digits: String = action[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.trim_end_matches('.').parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn entry(action: &str, kind: Option<ActionKind>) -> TimelineEntry {
        TimelineEntry {
            turn: 1,
            character: "Aria".to_string(),
            action: action.to_string(),
            healths: BTreeMap::new(),
            kind,
            amount: None,
        }
    }

    #[test]
    fn text_classification_matches_keywords() {
        assert_eq!(classify_text("Dealt 42 damage"), ActionKind::Damage);
        assert_eq!(classify_text("Cast heal for 30"), ActionKind::Heal);
        assert_eq!(classify_text("healed 30"), ActionKind::Heal);
        assert_eq!(classify_text("Defends"), ActionKind::Other);
        assert_eq!(classify_text("Dealt 42 Damage"), ActionKind::Other);
    }

    #[test]
    fn damage_wins_when_both_keywords_appear() {
        assert_eq!(classify_text("heal blocked, took 5 damage"), ActionKind::Damage);
    }

    #[test]
    fn structured_kind_overrides_text() {
        let classified = classify(&entry("Dealt 42 damage", Some(ActionKind::Heal)));
        assert_eq!(classified.kind, ActionKind::Heal);
        assert_eq!(classified.amount, Some(42.0));
    }

    #[test]
    fn embedded_amount_reads_first_number() {
        assert_eq!(embedded_amount("Dealt 42 damage"), Some(42.0));
        assert_eq!(embedded_amount("Healed 12.5 at turn 3"), Some(12.5));
        assert_eq!(embedded_amount("Ends turn."), None);
    }
}
