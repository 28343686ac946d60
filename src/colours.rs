use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Selector order for the team picker.
pub const TEAMS: [&str; 18] = [
    "Adelaide",
    "Brisbane Lions",
    "Carlton",
    "Collingwood",
    "Essendon",
    "Fremantle",
    "Geelong",
    "Gold Coast",
    "Greater Western Sydney",
    "Hawthorn",
    "Melbourne",
    "North Melbourne",
    "Port Adelaide",
    "Richmond",
    "St Kilda",
    "Sydney",
    "West Coast",
    "Western Bulldogs",
];

pub const FIRST_SEASON: i32 = 2011;
pub const LAST_SEASON: i32 = 2023;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const NEUTRAL: Rgb = Rgb {
        r: 0x80,
        g: 0x80,
        b: 0x80,
    };

    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Club colours like Collingwood's black vanish on a dark terminal; lift them.
    pub fn visible_on_dark(self) -> Self {
        let luma =
            (299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b)) / 1000;
        if luma >= 48 {
            return self;
        }
        let lift = |c: u8| c.saturating_add(96);
        Self {
            r: lift(self.r),
            g: lift(self.g),
            b: lift(self.b),
        }
    }
}

const CLUB_HEX: [(&str, &str); 18] = [
    ("Geelong", "#002B5C"),
    ("Sydney", "#E1251B"),
    ("Hawthorn", "#4D2004"),
    ("Collingwood", "#000000"),
    ("Richmond", "#FFD200"),
    ("West Coast", "#F2A900"),
    ("Adelaide", "#E21937"),
    ("Fremantle", "#2A0D54"),
    ("Port Adelaide", "#008AAB"),
    ("Western Bulldogs", "#20539D"),
    ("Essendon", "#CC2031"),
    ("Greater Western Sydney", "#F47920"),
    ("North Melbourne", "#1A3B8E"),
    ("St Kilda", "#ED1B2F"),
    ("Melbourne", "#0F1131"),
    ("Brisbane Lions", "#FDBE57"),
    ("Carlton", "#031A29"),
    ("Gold Coast", "#FFDD00"),
];

static CLUB_COLOURS: Lazy<HashMap<&'static str, Rgb>> = Lazy::new(|| {
    CLUB_HEX
        .iter()
        .filter_map(|(team, hex)| Rgb::parse_hex(hex).map(|rgb| (*team, rgb)))
        .collect()
});

pub fn team_colour(team: &str) -> Option<Rgb> {
    CLUB_COLOURS.get(team).copied()
}

pub fn team_colour_or_neutral(team: &str) -> Rgb {
    team_colour(team).unwrap_or(Rgb::NEUTRAL)
}

pub fn team_index(team: &str) -> Option<usize> {
    TEAMS.iter().position(|t| *t == team)
}
