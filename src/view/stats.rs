use crate::report::Report;

pub const NO_RUN_YET: &str = "No simulation run yet.";

/// One line per character: `"{name}: Damage: {d}, Healing: {h}, Spells: {s}"`.
/// Names missing from a map count as zero.
pub fn stats_lines(report: &Report) -> Vec<String> {
    report
        .character_names()
        .into_iter()
        .map(|name| {
            let damage = report.damage_dealt.get(&name).copied().unwrap_or(0.0);
            let healing = report.healing_done.get(&name).copied().unwrap_or(0.0);
            let spells = report.spells_cast.get(&name).copied().unwrap_or(0.0);
            format!("{name}: Damage: {damage}, Healing: {healing}, Spells: {spells}")
        })
        .collect()
}
