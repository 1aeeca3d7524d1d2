use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player identifier of the form `Name#1234`. An empty tag means no player is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleTag(pub String);

impl BattleTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Display name without the `#1234` discriminator.
    pub fn name(&self) -> &str {
        self.0.split('#').next().unwrap_or_default()
    }
}

impl fmt::Display for BattleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BattleTag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BattleTag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Season {
    pub id: u32,
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $($variant = $value),+
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(format!("unknown {} value {}", stringify!($name), other)),
                }
            }
        }
    };
}

wire_enum!(GameMode {
    Undefined = 0,
    OneVsOne = 1,
    TwoVsTwo = 2,
    FourVsFour = 4,
    FreeForAll = 5,
    TwoVsTwoArrangedTeam = 6,
});

wire_enum!(Gateway {
    America = 10,
    Europe = 20,
    Asia = 30,
});

wire_enum!(Race {
    Random = 0,
    Human = 1,
    Orc = 2,
    NightElf = 4,
    Undead = 8,
});

impl Default for GameMode {
    fn default() -> Self {
        Self::Undefined
    }
}

impl GameMode {
    /// Accepts the numeric wire value or a short name (`1v1`, `2v2`, `4v4`, `ffa`, `2v2at`).
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(value) = raw.trim().parse::<u8>() {
            return Self::try_from(value).ok();
        }
        match raw.trim().to_ascii_lowercase().as_str() {
            "1v1" => Some(Self::OneVsOne),
            "2v2" => Some(Self::TwoVsTwo),
            "4v4" => Some(Self::FourVsFour),
            "ffa" => Some(Self::FreeForAll),
            "2v2at" => Some(Self::TwoVsTwoArrangedTeam),
            _ => None,
        }
    }
}

impl Gateway {
    /// Accepts the numeric wire value or a region name (`america`, `europe`, `asia`).
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(value) = raw.trim().parse::<u8>() {
            return Self::try_from(value).ok();
        }
        match raw.trim().to_ascii_lowercase().as_str() {
            "america" | "us" => Some(Self::America),
            "europe" | "eu" => Some(Self::Europe),
            "asia" => Some(Self::Asia),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub battle_tag: BattleTag,
    pub name: String,
    #[serde(default)]
    pub participated_in_seasons: Vec<Season>,
    #[serde(default)]
    pub is_registered_on_patreon: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeStat {
    pub game_mode: GameMode,
    #[serde(default)]
    pub race: Option<Race>,
    pub gate_way: Gateway,
    pub season: u32,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
    pub winrate: f64,
    pub mmr: i32,
    pub rank: u32,
    #[serde(default)]
    pub league_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceStat {
    pub race: Race,
    pub gate_way: Gateway,
    pub season: u32,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
    pub winrate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceWinLoss {
    pub race: Race,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
    pub winrate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapWinLosses {
    pub map: String,
    pub win_losses: Vec<RaceWinLoss>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceWinsOnMap {
    pub race: Race,
    pub win_loses_on_map: Vec<MapWinLosses>,
}

/// Win/loss matrix of the player's race against each opponent race, per map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceVersusRaceOnMap {
    pub battle_tag: BattleTag,
    pub season: u32,
    #[serde(default)]
    pub race_wins_on_map: Vec<RaceWinsOnMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInTeam {
    pub battle_tag: BattleTag,
    pub name: String,
    pub race: Race,
    #[serde(default)]
    pub old_mmr: Option<i32>,
    #[serde(default)]
    pub current_mmr: Option<i32>,
    #[serde(default)]
    pub won: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub players: Vec<PlayerInTeam>,
    #[serde(default)]
    pub won: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub map: String,
    pub game_mode: GameMode,
    pub gate_way: Gateway,
    pub season: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_in_seconds: Option<u32>,
    pub teams: Vec<Team>,
}

/// One page of a player's match history plus the total number of matches across all pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchPage {
    pub count: u64,
    pub matches: Vec<Match>,
}

/// The live match of a player, if any. Absence is a normal state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "match", rename_all = "snake_case")]
pub enum OngoingMatch {
    #[default]
    None,
    Active(Match),
}

impl OngoingMatch {
    pub fn as_match(&self) -> Option<&Match> {
        match self {
            OngoingMatch::None => None,
            OngoingMatch::Active(m) => Some(m),
        }
    }
}

impl From<Option<Match>> for OngoingMatch {
    fn from(value: Option<Match>) -> Self {
        value.map_or(OngoingMatch::None, OngoingMatch::Active)
    }
}
