use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DatasetError, Result};

/// Columns the loader refuses to run without. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "Team",
    "Opposition",
    "Season",
    "Round",
    "Day",
    "WinLoss",
    "Margin",
    "ActualCrowd",
    "Venue",
    "HomeAway",
    "FinalScore",
    "Time",
    "LadderPosition",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinLoss {
    Win,
    Loss,
}

impl WinLoss {
    pub fn is_win(self) -> bool {
        self == WinLoss::Win
    }

    pub fn label(self) -> &'static str {
        match self {
            WinLoss::Win => "Win",
            WinLoss::Loss => "Loss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn label(self) -> &'static str {
        match self {
            HomeAway::Home => "Home",
            HomeAway::Away => "Away",
        }
    }
}

/// Round label as it appears in the file ("1", "R12", "QF", "Grand Final").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round(String);

impl Round {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// Home-and-away rounds by number, then finals week by week, then anything else.
    pub fn ordinal(&self) -> (u8, u32) {
        let raw = self.0.trim();
        if let Some(n) = parse_round_number(raw) {
            return (0, n);
        }
        let lower = raw.to_ascii_lowercase();
        let finals_week = match lower.as_str() {
            "ef" | "qf" => Some(1),
            "sf" => Some(2),
            "pf" => Some(3),
            "gf" => Some(4),
            _ if lower.contains("elimination") || lower.contains("qualifying") => Some(1),
            _ if lower.contains("semi") => Some(2),
            _ if lower.contains("preliminary") => Some(3),
            _ if lower.contains("grand") => Some(4),
            _ => None,
        };
        match finals_week {
            Some(week) => (1, week),
            None => (2, 0),
        }
    }
}

impl Ord for Round {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal()
            .cmp(&other.ordinal())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Round {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_round_number(raw: &str) -> Option<u32> {
    let lower = raw.to_ascii_lowercase();
    let digits = lower
        .strip_prefix("round")
        .or_else(|| lower.strip_prefix('r'))
        .unwrap_or(&lower)
        .trim();
    digits.parse::<u32>().ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchRecord {
    pub team: String,
    pub opposition: String,
    pub season: i32,
    pub round: Round,
    pub day: String,
    pub win_loss: WinLoss,
    pub margin: i32,
    pub actual_crowd: u32,
    pub venue: String,
    pub home_away: HomeAway,
    pub final_score: i32,
    pub time: f64,
    pub ladder_position: i32,
}

impl MatchRecord {
    pub fn is_win(&self) -> bool {
        self.win_loss.is_win()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<MatchRecord>,
    source: Option<PathBuf>,
}

impl Dataset {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self {
            records,
            source: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut dataset = Self::from_reader(file)?;
        dataset.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            records = dataset.len(),
            "loaded match dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        validate_headers(&headers)?;

        let mut records = Vec::new();
        let mut seen: HashSet<(String, i32, String)> = HashSet::new();
        let mut row = csv::StringRecord::new();
        while reader.read_record(&mut row)? {
            // Header is line 1.
            let line = row
                .position()
                .map(|p| p.line())
                .unwrap_or(records.len() as u64 + 2);
            let record: MatchRecord =
                row.deserialize(Some(&headers))
                    .map_err(|err| DatasetError::InvalidRow {
                        line,
                        message: row_error_message(&err, &headers),
                    })?;
            let key = (
                record.team.clone(),
                record.season,
                record.round.label().to_string(),
            );
            if !seen.insert(key) {
                return Err(DatasetError::InvalidRow {
                    line,
                    message: format!(
                        "duplicate Team/Season/Round ({}, {}, {})",
                        record.team, record.season, record.round
                    ),
                });
            }
            records.push(record);
        }
        debug!(records = records.len(), "parsed csv rows");
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Distinct team names in the order they first appear.
    pub fn teams(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.team.as_str())
            .filter(|team| seen.insert(*team))
            .collect()
    }

    pub fn seasons(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.season)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One team's games in one season, in round order.
    pub fn select(&self, team: &str, season: i32) -> Vec<&MatchRecord> {
        select_team_season(&self.records, team, season)
    }
}

pub fn select_team_season<'a>(
    records: &'a [MatchRecord],
    team: &str,
    season: i32,
) -> Vec<&'a MatchRecord> {
    let mut rows: Vec<&MatchRecord> = records
        .iter()
        .filter(|r| r.team == team && r.season == season)
        .collect();
    rows.sort_by(|a, b| a.round.cmp(&b.round));
    rows
}

fn validate_headers(headers: &csv::StringRecord) -> Result<()> {
    let present: HashSet<&str> = headers.iter().map(str::trim).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(*col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DatasetError::MissingColumns(missing))
    }
}

fn row_error_message(err: &csv::Error, headers: &csv::StringRecord) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(field) => {
                let column = headers.get(field as usize).unwrap_or("?");
                format!("field {field} ({column}): {}", err.kind())
            }
            None => err.kind().to_string(),
        },
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Team,Opposition,Season,Round,Day,WinLoss,Margin,ActualCrowd,Venue,HomeAway,FinalScore,Time,LadderPosition";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn parses_rows_and_enums() {
        let raw = csv_with(&[
            "Geelong,Sydney,2022,1,Sat,Win,24,45123,MCG,Home,96,19.4,3",
            "Geelong,Carlton,2022,2,Fri,Loss,-6,61000,MCG,Away,70,19.5,5",
        ]);
        let ds = Dataset::from_reader(raw.as_bytes()).expect("valid csv");
        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.team, "Geelong");
        assert_eq!(first.win_loss, WinLoss::Win);
        assert_eq!(first.home_away, HomeAway::Home);
        assert_eq!(first.day, "Sat");
        assert_eq!(ds.records()[1].margin, -6);
    }

    #[test]
    fn header_only_is_an_empty_dataset() {
        let ds = Dataset::from_reader(HEADER.as_bytes()).expect("header only");
        assert!(ds.is_empty());
        assert!(ds.teams().is_empty());
        assert!(ds.seasons().is_empty());
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let raw = "Team,Opposition,Season,Round,Day,WinLoss,Margin,ActualCrowd,Venue,HomeAway,FinalScore\n";
        let err = Dataset::from_reader(raw.as_bytes()).unwrap_err();
        match err {
            DatasetError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["Time".to_string(), "LadderPosition".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn draw_is_rejected_with_line_number() {
        let raw = csv_with(&[
            "Geelong,Sydney,2022,1,Sat,Win,24,45123,MCG,Home,96,19.4,3",
            "Geelong,Carlton,2022,2,Fri,Draw,0,61000,MCG,Away,70,19.5,5",
        ]);
        let err = Dataset::from_reader(raw.as_bytes()).unwrap_err();
        match err {
            DatasetError::InvalidRow { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_team_season_round_is_rejected() {
        let raw = csv_with(&[
            "Geelong,Sydney,2022,1,Sat,Win,24,45123,MCG,Home,96,19.4,3",
            "Geelong,Carlton,2022,2,Fri,Loss,-6,61000,MCG,Away,70,19.5,5",
            "Geelong,Sydney,2022, 1 ,Sat,Win,24,45123,MCG,Home,96,19.4,3",
        ]);
        let err = Dataset::from_reader(raw.as_bytes()).unwrap_err();
        match err {
            DatasetError::InvalidRow { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("duplicate Team/Season/Round"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_round_in_another_season_or_team_is_fine() {
        let raw = csv_with(&[
            "Geelong,Sydney,2022,1,Sat,Win,24,45123,MCG,Home,96,19.4,3",
            "Geelong,Sydney,2023,1,Sat,Win,24,45123,MCG,Home,96,19.4,3",
            "Sydney,Geelong,2022,1,Sat,Loss,-24,45123,MCG,Away,72,19.4,9",
        ]);
        let ds = Dataset::from_reader(raw.as_bytes()).expect("distinct rows");
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn round_ordering_puts_finals_last() {
        let mut rounds = vec![
            Round::new("GF"),
            Round::new("10"),
            Round::new("R2"),
            Round::new("QF"),
            Round::new("Preliminary Final"),
            Round::new("1"),
        ];
        rounds.sort();
        let labels: Vec<&str> = rounds.iter().map(Round::label).collect();
        assert_eq!(labels, vec!["1", "R2", "10", "QF", "Preliminary Final", "GF"]);
    }

    #[test]
    fn select_filters_and_sorts_by_round() {
        let raw = csv_with(&[
            "Geelong,Sydney,2022,3,Sat,Win,24,45123,MCG,Home,96,19.4,3",
            "Geelong,Carlton,2022,1,Fri,Loss,-6,61000,MCG,Away,70,19.5,5",
            "Geelong,Carlton,2021,1,Fri,Loss,-6,61000,MCG,Away,70,19.5,5",
            "Sydney,Geelong,2022,3,Sat,Loss,-24,45123,MCG,Away,72,19.4,8",
        ]);
        let ds = Dataset::from_reader(raw.as_bytes()).unwrap();
        let rows = ds.select("Geelong", 2022);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].round.label(), "1");
        assert_eq!(rows[1].round.label(), "3");
        assert!(ds.select("Geelong", 2011).is_empty());
        assert_eq!(ds.teams(), vec!["Geelong", "Sydney"]);
        assert_eq!(ds.seasons(), vec![2021, 2022]);
    }
}
