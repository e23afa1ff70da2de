//! Timeline export to CSV: one row per entry, one health column per character.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::report::{classify, ActionKind, Report};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
}

fn kind_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Damage => "damage",
        ActionKind::Heal => "heal",
        ActionKind::Other => "other",
    }
}

/// Health columns: every name in `characters` plus any name seen in a snapshot.
fn health_columns(report: &Report) -> Vec<String> {
    let mut names: BTreeSet<&str> = report.characters.keys().map(String::as_str).collect();
    for entry in &report.timeline {
        names.extend(entry.healths.keys().map(String::as_str));
    }
    names.into_iter().map(str::to_string).collect()
}

pub fn write_timeline_csv<W: Write>(report: &Report, out: W) -> Result<usize, ExportError> {
    let columns = health_columns(report);
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec![
        "turn".to_string(),
        "character".to_string(),
        "action".to_string(),
        "kind".to_string(),
        "amount".to_string(),
    ];
    header.extend(columns.iter().map(|name| format!("health_{name}")));
    writer.write_record(&header)?;

    for entry in &report.timeline {
        let classified = classify(entry);
        let mut row = vec![
            entry.turn.to_string(),
            entry.character.clone(),
            entry.action.clone(),
            kind_label(classified.kind).to_string(),
            classified.amount.map(|a| a.to_string()).unwrap_or_default(),
        ];
        row.extend(columns.iter().map(|name| {
            entry
                .healths
                .get(name)
                .map(|h| h.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(report.timeline.len())
}

pub fn export_timeline_file(report: &Report, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.display().to_string(),
        source,
    })?;
    write_timeline_csv(report, file)
}
