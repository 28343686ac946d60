use serde::Serialize;

use crate::colours::{Rgb, team_colour_or_neutral};
use crate::dataset::{MatchRecord, select_team_season};
use crate::win_pct::{GroupBy, WinPctRow, win_percentages_by};

/// Stadium capacities drawn across the crowd chart.
pub const VENUE_CAPACITIES: [(&str, u32, Rgb); 3] = [
    ("MCG", 100_024, Rgb { r: 0x00, g: 0x80, b: 0x00 }),
    ("Optus", 61_266, Rgb { r: 0xF2, g: 0xA9, b: 0x00 }),
    ("SCG", 48_000, Rgb { r: 0xFF, g: 0x00, b: 0x00 }),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarColouring {
    /// Each bar in its own club colour.
    PerTeam,
    Single(Rgb),
}

#[derive(Debug, Clone)]
pub struct BarSeries {
    pub title: String,
    pub rows: Vec<WinPctRow>,
    pub colouring: BarColouring,
}

impl BarSeries {
    pub fn bar_colour(&self, row: &WinPctRow) -> Rgb {
        match self.colouring {
            BarColouring::PerTeam => team_colour_or_neutral(&row.group),
            BarColouring::Single(rgb) => rgb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn league_win_bars(records: &[MatchRecord]) -> BarSeries {
    BarSeries {
        title: "Win percentage per team since 2011".to_string(),
        rows: win_percentages_by(records, GroupBy::Team),
        colouring: BarColouring::PerTeam,
    }
}

pub fn day_of_week_bars(records: &[MatchRecord], team: &str) -> BarSeries {
    BarSeries {
        title: format!("{team} win percentage per day of the week since 2011"),
        rows: win_percentages_by(records.iter().filter(|r| r.team == team), GroupBy::Day),
        colouring: BarColouring::Single(team_colour_or_neutral(team)),
    }
}

pub fn opposition_bars(records: &[MatchRecord], team: &str) -> BarSeries {
    BarSeries {
        title: format!("{team} win percentage against each team since 2011"),
        rows: win_percentages_by(
            records.iter().filter(|r| r.team == team),
            GroupBy::Opposition,
        ),
        colouring: BarColouring::Single(team_colour_or_neutral(team)),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarginSeries {
    pub title: String,
    /// x-axis labels, one per round played (byes are absent).
    pub rounds: Vec<String>,
    pub margins: Vec<(f64, f64)>,
    pub zero_line: Vec<(f64, f64)>,
}

impl MarginSeries {
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Symmetric around zero so the draw line stays centred.
    pub fn y_bounds(&self) -> [f64; 2] {
        let peak = self
            .margins
            .iter()
            .map(|(_, y)| y.abs())
            .fold(10.0_f64, f64::max);
        [-peak, peak]
    }
}

pub fn margin_series(records: &[MatchRecord], team: &str, season: i32) -> MarginSeries {
    let rows = select_team_season(records, team, season);
    let rounds = rows.iter().map(|r| r.round.label().to_string()).collect();
    let margins = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, f64::from(r.margin)))
        .collect();
    let zero_line = flat_line(rows.len(), 0.0);
    MarginSeries {
        title: format!("{team} margin per round in season {season}"),
        rounds,
        margins,
        zero_line,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceLine {
    pub label: &'static str,
    pub value: u32,
    #[serde(skip)]
    pub colour: Rgb,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrowdSeries {
    pub title: String,
    pub rounds: Vec<String>,
    pub wins: Vec<(f64, f64)>,
    pub losses: Vec<(f64, f64)>,
    pub references: Vec<ReferenceLine>,
}

impl CrowdSeries {
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn y_max(&self) -> f64 {
        let crowd = self
            .wins
            .iter()
            .chain(self.losses.iter())
            .map(|(_, y)| *y)
            .fold(0.0_f64, f64::max);
        let reference = self
            .references
            .iter()
            .map(|line| f64::from(line.value))
            .fold(0.0_f64, f64::max);
        crowd.max(reference) * 1.05
    }
}

pub fn crowd_series(records: &[MatchRecord], team: &str, season: i32) -> CrowdSeries {
    let rows = select_team_season(records, team, season);
    let mut wins = Vec::new();
    let mut losses = Vec::new();
    for (i, r) in rows.iter().enumerate() {
        let point = (i as f64, f64::from(r.actual_crowd));
        if r.is_win() {
            wins.push(point);
        } else {
            losses.push(point);
        }
    }
    let references = VENUE_CAPACITIES
        .iter()
        .map(|(label, value, colour)| ReferenceLine {
            label,
            value: *value,
            colour: *colour,
            points: flat_line(rows.len(), f64::from(*value)),
        })
        .collect();
    CrowdSeries {
        title: format!("{team} crowd attendance per round in season {season}"),
        rounds: rows.iter().map(|r| r.round.label().to_string()).collect(),
        wins,
        losses,
        references,
    }
}

fn flat_line(len: usize, y: f64) -> Vec<(f64, f64)> {
    match len {
        0 => Vec::new(),
        1 => vec![(0.0, y)],
        n => vec![(0.0, y), ((n - 1) as f64, y)],
    }
}
