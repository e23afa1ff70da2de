//! Horizontal placement of character sprites across the canvas.

use std::collections::BTreeMap;

use crate::view::health::{HealthBar, HealthScale};

pub const SPRITE_WIDTH: f64 = 50.0;
pub const SPRITE_HEIGHT: f64 = 100.0;
pub const BAR_WIDTH: f64 = 50.0;
pub const BAR_HEIGHT: f64 = 10.0;
/// Bar top-left relative to the sprite centre.
pub const BAR_OFFSET: (f64, f64) = (-25.0, -60.0);
/// Name label baseline relative to the sprite centre.
pub const LABEL_OFFSET: f64 = 50.0;
const ROW_LIFT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSlot {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub health: f64,
    pub bar: HealthBar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub spacing: f64,
    pub slots: Vec<CharacterSlot>,
}

/// Evenly spaced slots: `spacing = width / (n + 1)`, slot `i` at `(i + 1) * spacing`.
///
/// With no characters the spacing is the full width and there are no slots.
pub fn layout_characters(
    healths: &BTreeMap<String, f64>,
    scale: &HealthScale,
    width: f64,
    height: f64,
) -> Layout {
    let spacing = width / (healths.len() + 1) as f64;
    let y = height / 2.0 - ROW_LIFT;
    let slots = healths
        .iter()
        .enumerate()
        .map(|(index, (name, health))| CharacterSlot {
            name: name.clone(),
            x: (index + 1) as f64 * spacing,
            y,
            health: *health,
            bar: scale.map(*health, BAR_WIDTH),
        })
        .collect();
    Layout { spacing, slots }
}
