//! Report-to-view transformations: metrics, combat log, health bars, layout, stats.

use std::collections::BTreeMap;
use std::path::Path;

use combat_viewer::report::{load_report_file, parse_report_json, ActionKind, Report, TimelineEntry};
use combat_viewer::view::{
    derive_metrics, layout_characters, render_full, render_prefix, stats_lines, HealthScale,
    LogView, MetricsError, LOW_HEALTH_THRESHOLD,
};

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {b}, got {a}");
}

fn fixture_report() -> Report {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("ten_turn_report.json");
    load_report_file(path).expect("fixture should parse")
}

fn entry(turn: u32, action: &str, healths: &[(&str, f64)]) -> TimelineEntry {
    TimelineEntry {
        turn,
        character: "Aria".to_string(),
        action: action.to_string(),
        healths: healths.iter().map(|(n, h)| (n.to_string(), *h)).collect(),
        kind: None,
        amount: None,
    }
}

#[test]
fn ten_turn_scenario_metrics() {
    let report = fixture_report();
    let metrics = derive_metrics(&report, LOW_HEALTH_THRESHOLD).expect("turns > 0");

    assert_eq!(metrics.counts.damage_events, 3);
    assert_eq!(metrics.counts.heal_events, 1);
    assert_eq!(metrics.counts.low_health_events, 2);
    approx_eq(metrics.flux, 0.40, 1e-12);
    approx_eq(metrics.chaos, 0.30, 1e-12);
    approx_eq(metrics.flow, 0.80, 1e-12);
    approx_eq(metrics.tension, 0.20, 1e-12);
    assert_eq!(metrics.pulse, 1.0);
    assert_eq!(
        metrics.panel_text(),
        "Metrics\nFLUX: 0.40\nCHAOS: 0.30\nFlow: 0.80\nTension: 0.20\nPULSE: 1"
    );
}

#[test]
fn zero_turns_is_rejected_instead_of_nan() {
    let report = Report {
        total_turns: 0,
        timeline: vec![entry(1, "Dealt 5 damage", &[("Aria", 10.0)])],
        ..Report::default()
    };
    assert_eq!(
        derive_metrics(&report, LOW_HEALTH_THRESHOLD),
        Err(MetricsError::NoTurns)
    );
}

#[test]
fn metrics_stay_bounded_when_entries_outnumber_turns() {
    for total_turns in 1..6 {
        let timeline = (0..12)
            .map(|i| {
                let action = if i % 2 == 0 { "Dealt 10 damage" } else { "Cast heal" };
                entry(i, action, &[("Aria", 50.0)])
            })
            .collect();
        let report = Report {
            total_turns,
            timeline,
            ..Report::default()
        };
        let metrics = derive_metrics(&report, LOW_HEALTH_THRESHOLD).expect("turns > 0");
        for value in [metrics.flux, metrics.chaos, metrics.tension] {
            assert!(value.is_finite());
            assert!((0.0..=1.0).contains(&value), "turns={total_turns} value={value}");
        }
        assert!(metrics.pulse == 0.0 || metrics.pulse == 1.0);
    }
}

#[test]
fn quiet_report_has_no_pulse() {
    let report = Report {
        total_turns: 3,
        timeline: vec![
            entry(1, "Waits", &[("Aria", 900.0)]),
            entry(2, "Waits", &[("Aria", 900.0)]),
        ],
        ..Report::default()
    };
    let metrics = derive_metrics(&report, LOW_HEALTH_THRESHOLD).expect("turns > 0");
    assert_eq!(metrics.flux, 0.0);
    assert_eq!(metrics.tension, 0.0);
    assert_eq!(metrics.pulse, 0.0);
    assert_eq!(metrics.flow, 0.5);
}

#[test]
fn structured_kind_drives_classification() {
    let json = r#"{
        "total_turns": 2,
        "timeline": [
            {"turn": 1, "character": "Aria", "action": "Smite", "kind": "damage", "amount": 40, "healths": {}},
            {"turn": 2, "character": "Aria", "action": "Dealt 3 damage", "kind": "other", "healths": {}}
        ]
    }"#;
    let report = parse_report_json(json).expect("valid report");
    assert_eq!(report.timeline[0].kind, Some(ActionKind::Damage));

    let metrics = derive_metrics(&report, LOW_HEALTH_THRESHOLD).expect("turns > 0");
    assert_eq!(metrics.counts.damage_events, 1);
    approx_eq(metrics.chaos, 0.5, 1e-12);
}

#[test]
fn prefix_length_is_cursor_plus_one_clamped() {
    let report = fixture_report();
    for turn_index in [0usize, 3, 9, 10, 50, usize::MAX] {
        let view = render_prefix(&report, turn_index);
        assert_eq!(
            view.lines.len(),
            turn_index.saturating_add(1).min(report.timeline.len())
        );
    }
}

#[test]
fn prefix_lines_use_turn_actor_action() {
    let report = fixture_report();
    let view = render_prefix(&report, 1);
    assert_eq!(
        view.to_text(),
        "Combat Log:\nTurn 1: Aria Dealt 120 damage to Brom\nTurn 2: Brom Dealt 90 damage to Aria"
    );
}

#[test]
fn full_log_appends_health_snapshot() {
    let report = fixture_report();
    let view = render_full(&report);
    assert_eq!(view.lines.len(), 10);
    assert_eq!(
        view.lines[3],
        r#"Turn 4: Brom Casts heal for 60 - Healths: {"Aria":910.0,"Brom":940.0}"#
    );
}

#[test]
fn empty_timeline_renders_awaiting_header() {
    let report = Report {
        total_turns: 4,
        ..Report::default()
    };
    let prefix = render_prefix(&report, 2);
    assert!(prefix.lines.is_empty());
    assert_eq!(prefix.to_text(), "Combat Log:\nAwaiting simulation...");
    assert_eq!(render_full(&report).to_text(), LogView::awaiting().to_text());
}

#[test]
fn health_bar_clamps_width_but_not_ratio() {
    let scale = HealthScale::default();

    let negative = scale.map(-250.0, 50.0);
    assert_eq!(negative.fill_width, 0.0);
    assert!(negative.low_health);

    let over = scale.map(1500.0, 50.0);
    assert_eq!(over.fill_width, 50.0);
    approx_eq(over.ratio, 1.5, 1e-12);
    assert!(!over.low_health);

    let exact = scale.map(1000.0, 50.0);
    assert_eq!(exact.fill_width, 50.0);

    let half = scale.map(500.0, 50.0);
    approx_eq(half.fill_width, 25.0, 1e-12);
}

#[test]
fn low_health_flag_is_strictly_below_a_fifth() {
    let scale = HealthScale::default();
    assert!(scale.map(199.0, 50.0).low_health);
    assert!(!scale.map(200.0, 50.0).low_health);
}

#[test]
fn empty_characters_layout_uses_single_slot_spacing() {
    let layout = layout_characters(&BTreeMap::new(), &HealthScale::default(), 800.0, 600.0);
    assert_eq!(layout.spacing, 800.0);
    assert!(layout.slots.is_empty());
}

#[test]
fn layout_spaces_characters_evenly() {
    let report = fixture_report();
    let layout = layout_characters(
        &report.final_healths(),
        &HealthScale::default(),
        800.0,
        600.0,
    );
    approx_eq(layout.spacing, 800.0 / 3.0, 1e-9);
    let names: Vec<&str> = layout.slots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Aria", "Brom"]);
    approx_eq(layout.slots[1].x, 2.0 * 800.0 / 3.0, 1e-9);
    assert_eq!(layout.slots[0].y, 250.0);
    assert!(layout.slots[1].bar.low_health);
    approx_eq(layout.slots[1].bar.fill_width, 7.5, 1e-9);
}

#[test]
fn stats_lines_default_missing_values_to_zero() {
    let report = fixture_report();
    assert_eq!(
        stats_lines(&report),
        vec![
            "Aria: Damage: 880, Healing: 0, Spells: 0".to_string(),
            "Brom: Damage: 90, Healing: 60, Spells: 1".to_string(),
        ]
    );
}
