use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::dataset::{MatchRecord, select_team_season};
use crate::win_pct::{GroupBy, WinPctRow, win_percentages_by};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub teams: usize,
    pub days: usize,
    pub oppositions: usize,
    pub season_games: usize,
}

/// Write the dashboard tables for one team/season selection to an xlsx workbook.
pub fn export_workbook(
    path: &Path,
    records: &[MatchRecord],
    team: &str,
    season: i32,
) -> Result<ExportReport> {
    let team_rows = win_percentages_by(records, GroupBy::Team);
    let day_rows = win_percentages_by(records.iter().filter(|r| r.team == team), GroupBy::Day);
    let opposition_rows = win_percentages_by(
        records.iter().filter(|r| r.team == team),
        GroupBy::Opposition,
    );
    let season_games = select_team_season(records, team, season);

    let teams_sheet = win_pct_rows(GroupBy::Team.label(), &team_rows);
    let day_sheet = win_pct_rows(GroupBy::Day.label(), &day_rows);
    let opposition_sheet = win_pct_rows(GroupBy::Opposition.label(), &opposition_rows);

    let mut season_sheet = vec![vec![
        "Round".to_string(),
        "Opposition".to_string(),
        "Venue".to_string(),
        "Day".to_string(),
        "Result".to_string(),
        "Margin".to_string(),
        "Crowd".to_string(),
    ]];
    season_sheet.extend(season_games.iter().map(|r| {
        vec![
            r.round.label().to_string(),
            r.opposition.clone(),
            r.venue.clone(),
            r.day.clone(),
            r.win_loss.label().to_string(),
            r.margin.to_string(),
            r.actual_crowd.to_string(),
        ]
    }));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Teams")?;
        write_rows(sheet, &teams_sheet)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Day")?;
        write_rows(sheet, &day_sheet)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Opposition")?;
        write_rows(sheet, &opposition_sheet)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Season")?;
        write_rows(sheet, &season_sheet)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        teams: team_rows.len(),
        days: day_rows.len(),
        oppositions: opposition_rows.len(),
        season_games: season_games.len(),
    })
}

fn win_pct_rows(group_header: &str, rows: &[WinPctRow]) -> Vec<Vec<String>> {
    let mut out = vec![vec![
        group_header.to_string(),
        "Wins".to_string(),
        "Matches".to_string(),
        "Win %".to_string(),
    ]];
    out.extend(rows.iter().map(|row| {
        vec![
            row.group.clone(),
            row.wins.to_string(),
            row.matches.to_string(),
            row.win_pct.to_string(),
        ]
    }));
    out
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
