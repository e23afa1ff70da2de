//! Report ingestion: parse from the service body or a saved file, plus consistency checks.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::report::model::Report;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid report json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Non-fatal inconsistency found in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportIssue {
    TurnOrder { index: usize, previous: u32, turn: u32 },
    UnknownActor { index: usize, character: String },
}

impl fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnOrder {
                index,
                previous,
                turn,
            } => write!(
                f,
                "timeline[{index}]: turn {turn} goes backwards from {previous}"
            ),
            Self::UnknownActor { index, character } => write!(
                f,
                "timeline[{index}]: actor '{character}' is not listed in characters"
            ),
        }
    }
}

/// Parse a report from JSON text (the `GET /combat/report` body shape).
pub fn parse_report_json(input: &str) -> Result<Report, ReportError> {
    Ok(serde_json::from_str(input)?)
}

pub fn load_report_file(path: impl AsRef<Path>) -> Result<Report, ReportError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_report_json(&raw)
}

/// Check timeline ordering and actor names. An empty result means the report is consistent.
pub fn validate_report(report: &Report) -> Vec<ReportIssue> {
    let mut issues = Vec::new();
    let mut previous: Option<u32> = None;
    for (index, entry) in report.timeline.iter().enumerate() {
        if let Some(prev) = previous {
            if entry.turn < prev {
                issues.push(ReportIssue::TurnOrder {
                    index,
                    previous: prev,
                    turn: entry.turn,
                });
            }
        }
        previous = Some(entry.turn);

        if !report.characters.is_empty() && !report.characters.contains_key(&entry.character) {
            issues.push(ReportIssue::UnknownActor {
                index,
                character: entry.character.clone(),
            });
        }
    }
    issues
}
