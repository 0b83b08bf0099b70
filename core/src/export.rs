use crate::stats::ExtractedGameStats;
use crate::{Event, SaveData};
use std::fmt;

pub const CSV_HEADERS: [&str; 19] = [
    "Player Name",
    "Jersey #",
    "Points",
    "FGM",
    "FGA",
    "FG%",
    "3PM",
    "3PA",
    "3P%",
    "FTM",
    "FTA",
    "FT%",
    "AST",
    "REB",
    "STL",
    "BLK",
    "TOV",
    "FOULS",
    "SUB",
];

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Json(serde_json::Error),
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Csv(e) => write!(f, "CSV export failed: {e}"),
            ExportError::Json(e) => write!(f, "JSON export failed: {e}"),
            ExportError::Utf8(e) => write!(f, "export produced invalid UTF-8: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Json(e)
    }
}

/// Spreadsheets evaluate cells starting with `=`, `+`, `-` or `@`; a leading
/// apostrophe keeps them as text.
pub fn neutralize_formula(field: &str) -> String {
    match field.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{field}"),
        _ => field.to_owned(),
    }
}

/// One row per player, headers first. Fields with quotes, commas or newlines
/// are quoted by the writer with quotes doubled.
pub fn stats_to_csv(stats: &ExtractedGameStats) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for p in &stats.box_score.player_stats {
        let row = [
            p.player_name.clone(),
            p.jersey_number.to_string(),
            p.total_points.to_string(),
            p.field_goals_made.to_string(),
            p.field_goals_attempted.to_string(),
            p.field_goal_percentage.to_string(),
            p.three_pointers_made.to_string(),
            p.three_pointers_attempted.to_string(),
            p.three_point_percentage.to_string(),
            p.free_throws_made.to_string(),
            p.free_throws_attempted.to_string(),
            p.free_throw_percentage.to_string(),
            p.assists.to_string(),
            p.rebounds.to_string(),
            p.steals.to_string(),
            p.blocks.to_string(),
            p.turnovers.to_string(),
            p.fouls.to_string(),
            p.substitutions.to_string(),
        ];
        writer.write_record(row.iter().map(|f| neutralize_formula(f)))?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(ExportError::Utf8)
}

pub fn stats_to_json(stats: &ExtractedGameStats) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(stats)?)
}

pub fn save_to_json(save: &SaveData) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(save)?)
}

/// Chapter list for a video description: `MM:SS - description`, one line per
/// event in video order.
pub fn youtube_timestamps(events: &[Event]) -> String {
    crate::event_log::sorted_events(events)
        .into_iter()
        .map(|e| format!("{} - {}", crate::format_time(e.timestamp), e.description))
        .collect::<Vec<_>>()
        .join("\n")
}
