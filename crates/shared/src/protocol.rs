use serde::{Deserialize, Serialize};

use crate::domain::{GameMode, Gateway, Match, MatchPage};

/// Query string of the per-season stats endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStatsQuery {
    #[serde(rename = "gateWay")]
    pub gateway: Gateway,
    pub season: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonQuery {
    pub season: u32,
}

/// Query string of `matches/search`. `offset` counts matches, not pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSearchQuery {
    pub player_id: String,
    pub gateway: Gateway,
    pub offset: u64,
    pub page_size: u32,
    pub game_mode: GameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub count: u64,
}

impl From<MatchesResponse> for MatchPage {
    fn from(value: MatchesResponse) -> Self {
        MatchPage {
            count: value.count,
            matches: value.matches,
        }
    }
}
