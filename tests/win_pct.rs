use afl_terminal::dataset::{HomeAway, MatchRecord, Round, WinLoss, select_team_season};
use afl_terminal::win_pct::{GroupBy, compute_win_percentages, win_percentages_by};

fn game(team: &str, season: i32, round: u32, win: bool) -> MatchRecord {
    MatchRecord {
        team: team.to_string(),
        opposition: "Carlton".to_string(),
        season,
        round: Round::new(round.to_string()),
        day: "Sat".to_string(),
        win_loss: if win { WinLoss::Win } else { WinLoss::Loss },
        margin: if win { 12 } else { -12 },
        actual_crowd: 40_000,
        venue: "MCG".to_string(),
        home_away: HomeAway::Home,
        final_score: 80,
        time: 19.4,
        ladder_position: 4,
    }
}

fn season_of(team: &str, wins: usize, losses: usize) -> Vec<MatchRecord> {
    (0..wins + losses)
        .map(|i| game(team, 2022, i as u32 + 1, i < wins))
        .collect()
}

#[test]
fn seven_wins_in_ten_is_seventy() {
    let records = season_of("Geelong", 7, 3);
    let rows = compute_win_percentages(&records, |r| r.team.as_str());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].group, "Geelong");
    assert_eq!(rows[0].win_pct, 70);
    assert_eq!((rows[0].wins, rows[0].matches), (7, 10));
}

#[test]
fn one_win_one_loss_is_fifty() {
    let records = season_of("Sydney", 1, 1);
    let rows = win_percentages_by(&records, GroupBy::Team);
    assert_eq!(rows[0].win_pct, 50);
}

#[test]
fn half_way_percentages_round_to_even() {
    let mut records = season_of("Carlton", 1, 7);
    records.extend(season_of("Essendon", 3, 5));
    let rows = win_percentages_by(&records, GroupBy::Team);
    assert_eq!(rows[0].group, "Essendon");
    assert_eq!(rows[0].win_pct, 38);
    assert_eq!(rows[1].group, "Carlton");
    assert_eq!(rows[1].win_pct, 12);
}

#[test]
fn ties_keep_first_encounter_order() {
    let mut records = season_of("Hawthorn", 3, 2);
    records.extend(season_of("Richmond", 4, 1));
    records.extend(season_of("Adelaide", 8, 2));
    let rows = win_percentages_by(&records, GroupBy::Team);
    let order: Vec<(&str, u8)> = rows.iter().map(|r| (r.group.as_str(), r.win_pct)).collect();
    assert_eq!(order, vec![("Richmond", 80), ("Adelaide", 80), ("Hawthorn", 60)]);
}

#[test]
fn interleaved_groups_use_first_appearance() {
    let records = vec![
        game("Adelaide", 2022, 1, true),
        game("Richmond", 2022, 1, true),
        game("Adelaide", 2022, 2, false),
        game("Richmond", 2022, 2, false),
    ];
    let rows = win_percentages_by(&records, GroupBy::Team);
    assert_eq!(rows[0].group, "Adelaide");
    assert_eq!(rows[1].group, "Richmond");
}

#[test]
fn all_loss_and_all_win_groups_report_extremes() {
    let mut records = season_of("North Melbourne", 0, 4);
    records.extend(season_of("Geelong", 3, 0));
    let rows = win_percentages_by(&records, GroupBy::Team);
    assert_eq!(rows[0].group, "Geelong");
    assert_eq!(rows[0].win_pct, 100);
    assert_eq!(rows[1].group, "North Melbourne");
    assert_eq!(rows[1].win_pct, 0);
}

#[test]
fn empty_selection_yields_empty_result() {
    let records = season_of("Geelong", 7, 3);
    let selected = select_team_season(&records, "Geelong", 2011);
    assert!(selected.is_empty());
    let rows = win_percentages_by(selected, GroupBy::Day);
    assert!(rows.is_empty());
    let none: Vec<MatchRecord> = Vec::new();
    assert!(compute_win_percentages(&none, |r| r.team.as_str()).is_empty());
}

#[test]
fn percentages_stay_in_range_and_are_idempotent() {
    let mut records = Vec::new();
    let teams = ["Adelaide", "Carlton", "Fremantle", "Melbourne", "St Kilda"];
    for (i, team) in teams.iter().enumerate() {
        records.extend(season_of(team, i * 3 % 7, (i * 5 + 1) % 6));
    }
    let first = win_percentages_by(&records, GroupBy::Team);
    let second = win_percentages_by(&records, GroupBy::Team);
    assert_eq!(first, second);
    assert!(!first.is_empty());
    for row in &first {
        assert!(row.win_pct <= 100);
        assert!(row.matches > 0);
        assert!(row.wins <= row.matches);
    }
    assert!(first.windows(2).all(|w| w[0].win_pct >= w[1].win_pct));
}
