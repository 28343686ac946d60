use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use afl_terminal::charts::{self, CrowdSeries, MarginSeries};
use afl_terminal::classifier::{ClassifierReport, run_win_loss_demo};
use afl_terminal::colours::team_colour_or_neutral;
use afl_terminal::config::{self, DataArgs, SvmArgs};
use afl_terminal::dataset::Dataset;
use afl_terminal::logging;
use afl_terminal::win_pct::{GroupBy, WinPctRow};

/// Print the dashboard tables without the terminal UI.
#[derive(Debug, Parser)]
#[command(name = "report")]
struct ReportArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    svm: SvmArgs,

    /// Emit one JSON document instead of text tables.
    #[arg(long)]
    json: bool,

    /// Also fit the Win/Loss SVM demo.
    #[arg(long)]
    model: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    team: String,
    colour: String,
    season: i32,
    matches: usize,
    teams: usize,
    seasons: Vec<i32>,
    league: Vec<WinPctRow>,
    by_day: Vec<WinPctRow>,
    by_opposition: Vec<WinPctRow>,
    margin: MarginSeries,
    crowd: CrowdSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ClassifierReport>,
}

fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    let args = ReportArgs::parse();
    logging::init_stderr_logger(args.verbose);
    args.data.validate()?;

    let dataset = Dataset::load(&args.data.csv)
        .with_context(|| format!("load match results from {}", args.data.csv.display()))?;
    let records = dataset.records();
    let team = args.data.team.as_str();
    let season = args.data.season;

    let model = if args.model {
        Some(run_win_loss_demo(records, &args.svm.config()?)?)
    } else {
        None
    };

    let report = Report {
        team: team.to_string(),
        colour: team_colour_or_neutral(team).hex(),
        season,
        matches: dataset.len(),
        teams: dataset.teams().len(),
        seasons: dataset.seasons(),
        league: charts::league_win_bars(records).rows,
        by_day: charts::day_of_week_bars(records, team).rows,
        by_opposition: charts::opposition_bars(records, team).rows,
        margin: charts::margin_series(records, team, season),
        crowd: charts::crowd_series(records, team, season),
        model,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match (report.seasons.first(), report.seasons.last()) {
        (Some(first), Some(last)) => println!(
            "{} matches, {} teams, seasons {first}-{last}",
            report.matches, report.teams
        ),
        _ => println!("no matches loaded"),
    }
    println!();

    print_table("Win percentage per team", GroupBy::Team, &report.league);
    print_table(&format!("{team} by day of week"), GroupBy::Day, &report.by_day);
    print_table(&format!("{team} by opposition"), GroupBy::Opposition, &report.by_opposition);

    println!("{team} season {season} ({})", report.colour);
    let games = dataset.select(team, season);
    if games.is_empty() {
        println!("  no matches");
    }
    for game in games {
        println!(
            "  R{:<4} {:<18} {:<4} {:>+5}  crowd {:>7}",
            game.round.label(),
            game.opposition,
            game.win_loss.label(),
            game.margin,
            game.actual_crowd
        );
    }
    println!();

    if let Some(model) = &report.model {
        let m = &model.matrix;
        println!("SVM confusion matrix (rows actual, cols predicted)");
        println!("         Win   Loss");
        println!("  Win  {:>5}  {:>5}", m.cells[0][0], m.cells[0][1]);
        println!("  Loss {:>5}  {:>5}", m.cells[1][0], m.cells[1][1]);
        println!(
            "  accuracy {:.1}% ({} train / {} test)",
            model.accuracy() * 100.0,
            model.train_size,
            model.test_size
        );
    }

    Ok(())
}

fn print_table(title: &str, group_by: GroupBy, rows: &[WinPctRow]) {
    println!("{title}");
    if rows.is_empty() {
        println!("  no matches");
    }
    for row in rows {
        println!(
            "  {:<24} {:>3}%  {:>4}/{:<4}",
            row.group, row.win_pct, row.wins, row.matches
        );
    }
    if !rows.is_empty() {
        println!("  ({} groups by {})", rows.len(), group_by.label());
    }
    println!();
}
