pub mod action;
pub mod ingest;
pub mod model;

pub use action::{classify, ActionKind, Classified};
pub use ingest::{load_report_file, parse_report_json, validate_report, ReportError, ReportIssue};
pub use model::{CharacterState, Report, TimelineEntry};
