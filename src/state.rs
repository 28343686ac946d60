use std::collections::VecDeque;

use chrono::Local;

use crate::charts::{
    self, BarSeries, CrowdSeries, MarginSeries, crowd_series, day_of_week_bars, margin_series,
    opposition_bars,
};
use crate::classifier::{ClassifierReport, SvmConfig, run_win_loss_demo};
use crate::colours::{FIRST_SEASON, LAST_SEASON, TEAMS, team_index};
use crate::dataset::Dataset;
use crate::error::ClassifierError;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Team,
    Season,
    Model,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Overview, Screen::Team, Screen::Season, Screen::Model];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Overview => "OVERVIEW",
        Screen::Team => "TEAM",
        Screen::Season => "SEASON",
        Screen::Model => "MODEL",
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset: Dataset,
    pub screen: Screen,
    pub team_selected: usize,
    pub season: i32,
    pub league: BarSeries,
    pub by_day: BarSeries,
    pub by_opposition: BarSeries,
    pub margin: MarginSeries,
    pub crowd: CrowdSeries,
    pub svm_config: SvmConfig,
    pub classifier: Option<Result<ClassifierReport, ClassifierError>>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(dataset: Dataset, team: &str, season: i32, svm_config: SvmConfig) -> Self {
        let team_selected = team_index(team).unwrap_or(0);
        let season = season.clamp(FIRST_SEASON, LAST_SEASON);
        let records = dataset.records();
        let selected_team = TEAMS[team_selected];
        let league = charts::league_win_bars(records);
        let by_day = day_of_week_bars(records, selected_team);
        let by_opposition = opposition_bars(records, selected_team);
        let margin = margin_series(records, selected_team, season);
        let crowd = crowd_series(records, selected_team, season);
        Self {
            dataset,
            screen: Screen::Overview,
            team_selected,
            season,
            league,
            by_day,
            by_opposition,
            margin,
            crowd,
            svm_config,
            classifier: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn team(&self) -> &'static str {
        TEAMS[self.team_selected]
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        if screen == Screen::Model {
            self.ensure_classifier();
        }
    }

    pub fn next_screen(&mut self) {
        self.set_screen(self.screen.next());
    }

    pub fn prev_screen(&mut self) {
        self.set_screen(self.screen.prev());
    }

    pub fn next_team(&mut self) {
        self.team_selected = (self.team_selected + 1) % TEAMS.len();
        self.refresh_team_views();
    }

    pub fn prev_team(&mut self) {
        self.team_selected = (self.team_selected + TEAMS.len() - 1) % TEAMS.len();
        self.refresh_team_views();
    }

    pub fn next_season(&mut self) {
        self.season = if self.season >= LAST_SEASON {
            FIRST_SEASON
        } else {
            self.season + 1
        };
        self.refresh_season_views();
    }

    pub fn prev_season(&mut self) {
        self.season = if self.season <= FIRST_SEASON {
            LAST_SEASON
        } else {
            self.season - 1
        };
        self.refresh_season_views();
    }

    fn refresh_team_views(&mut self) {
        let team = self.team();
        let records = self.dataset.records();
        self.by_day = day_of_week_bars(records, team);
        self.by_opposition = opposition_bars(records, team);
        self.refresh_season_views();
        if self.by_day.is_empty() {
            self.push_log(format!("[INFO] No matches for {team}"));
        }
    }

    fn refresh_season_views(&mut self) {
        let team = self.team();
        let records = self.dataset.records();
        self.margin = margin_series(records, team, self.season);
        self.crowd = crowd_series(records, team, self.season);
    }

    /// The model ignores the selection, so it is fitted once on first view.
    pub fn ensure_classifier(&mut self) {
        if self.classifier.is_some() {
            return;
        }
        let result = run_win_loss_demo(self.dataset.records(), &self.svm_config);
        match &result {
            Ok(report) => self.push_log(format!(
                "[INFO] SVM trained on {} matches, accuracy {:.1}% on {}",
                report.train_size,
                report.accuracy() * 100.0,
                report.test_size
            )),
            Err(err) => self.push_log(format!("[WARN] SVM unavailable: {err}")),
        }
        self.classifier = Some(result);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!(target: "afl_terminal::console", "{msg}");
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        let stamp = Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {msg}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let raw = "Team,Opposition,Season,Round,Day,WinLoss,Margin,ActualCrowd,Venue,HomeAway,FinalScore,Time,LadderPosition\n\
                   Geelong,Sydney,2022,1,Sat,Win,24,45123,MCG,Home,96,19.4,3\n\
                   Geelong,Carlton,2023,2,Fri,Loss,-6,61000,MCG,Away,70,19.5,5\n";
        let ds = Dataset::from_reader(raw.as_bytes()).unwrap();
        AppState::new(ds, "Geelong", 2023, SvmConfig::default())
    }

    #[test]
    fn team_selection_wraps() {
        let mut s = state();
        assert_eq!(s.team(), "Geelong");
        for _ in 0..TEAMS.len() {
            s.next_team();
        }
        assert_eq!(s.team(), "Geelong");
        s.team_selected = 0;
        s.prev_team();
        assert_eq!(s.team(), "Western Bulldogs");
    }

    #[test]
    fn season_change_recomputes_views() {
        let mut s = state();
        assert_eq!(s.margin.rounds, vec!["2"]);
        s.prev_season();
        assert_eq!(s.season, 2022);
        assert_eq!(s.margin.rounds, vec!["1"]);
        s.season = LAST_SEASON;
        s.next_season();
        assert_eq!(s.season, FIRST_SEASON);
        assert!(s.margin.is_empty());
        assert!(s.crowd.is_empty());
    }

    #[test]
    fn team_without_matches_has_empty_views() {
        let mut s = state();
        s.next_team();
        assert_eq!(s.team(), "Gold Coast");
        assert!(s.by_day.is_empty());
        assert!(s.by_opposition.is_empty());
        assert!(s.logs.back().is_some_and(|l| l.contains("No matches for Gold Coast")));
    }

    #[test]
    fn model_screen_fits_once() {
        let mut s = state();
        s.set_screen(Screen::Model);
        assert!(s.classifier.is_some());
        let logs = s.logs.len();
        s.set_screen(Screen::Overview);
        s.set_screen(Screen::Model);
        assert_eq!(s.logs.len(), logs);
        assert_eq!(Screen::Model.next(), Screen::Overview);
        assert_eq!(Screen::Overview.prev(), Screen::Model);
    }
}
