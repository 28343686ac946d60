use std::collections::HashMap;

use serde::Serialize;

use crate::dataset::MatchRecord;

/// One group's share of wins, as plotted on the win-percentage bar charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinPctRow {
    pub group: String,
    pub wins: u32,
    pub matches: u32,
    pub win_pct: u8,
}

/// Ready-made grouping keys for the dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Team,
    Day,
    Opposition,
}

impl GroupBy {
    pub fn key(self, record: &MatchRecord) -> &str {
        match self {
            GroupBy::Team => &record.team,
            GroupBy::Day => &record.day,
            GroupBy::Opposition => &record.opposition,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupBy::Team => "Team",
            GroupBy::Day => "Day",
            GroupBy::Opposition => "Opposition",
        }
    }
}

/// Win percentage per group, highest first.
///
/// Percentages are rounded half-to-even (1 win in 8 gives 12, 3 in 8 gives 38).
/// Groups with equal percentages keep the order in which their key first
/// appeared in `records`.
pub fn compute_win_percentages<'a, I, K>(records: I, key: K) -> Vec<WinPctRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
    K: Fn(&'a MatchRecord) -> &'a str,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut tallies: Vec<(&'a str, u32, u32)> = Vec::new();

    for record in records {
        let group = key(record);
        let slot = *index.entry(group).or_insert_with(|| {
            tallies.push((group, 0, 0));
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];
        tally.2 += 1;
        if record.is_win() {
            tally.1 += 1;
        }
    }

    let mut rows: Vec<WinPctRow> = tallies
        .into_iter()
        .filter(|(_, _, matches)| *matches > 0)
        .map(|(group, wins, matches)| WinPctRow {
            group: group.to_string(),
            wins,
            matches,
            win_pct: percent_half_even(wins, matches),
        })
        .collect();

    // sort_by is stable: ties stay in first-encounter order.
    rows.sort_by(|a, b| b.win_pct.cmp(&a.win_pct));
    rows
}

pub fn win_percentages_by<'a, I>(records: I, group_by: GroupBy) -> Vec<WinPctRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    compute_win_percentages(records, move |r| group_by.key(r))
}

/// round(100 * wins / matches) on the exact fraction, ties to even.
fn percent_half_even(wins: u32, matches: u32) -> u8 {
    debug_assert!(matches > 0 && wins <= matches);
    let num = 100 * u64::from(wins);
    let den = u64::from(matches);
    let quotient = num / den;
    let twice_rem = 2 * (num % den);
    let rounded = if twice_rem > den || (twice_rem == den && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };
    rounded.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::percent_half_even;

    #[test]
    fn half_even_at_the_boundary() {
        assert_eq!(percent_half_even(1, 2), 50);
        assert_eq!(percent_half_even(1, 8), 12);
        assert_eq!(percent_half_even(3, 8), 38);
        assert_eq!(percent_half_even(5, 8), 62);
        assert_eq!(percent_half_even(7, 8), 88);
    }

    #[test]
    fn ordinary_rounding() {
        assert_eq!(percent_half_even(1, 3), 33);
        assert_eq!(percent_half_even(2, 3), 67);
        assert_eq!(percent_half_even(0, 5), 0);
        assert_eq!(percent_half_even(5, 5), 100);
    }
}
