//! Scoping values shared by every player fetch.

use serde::Serialize;
use shared::domain::{BattleTag, GameMode, Gateway, Season};
use tokio::sync::watch;

/// The region the outer scope currently has selected. Read-only from the player core.
pub trait GatewaySource: Send + Sync {
    fn current_gateway(&self) -> Gateway;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedGateway(pub Gateway);

impl GatewaySource for FixedGateway {
    fn current_gateway(&self) -> Gateway {
        self.0
    }
}

impl GatewaySource for watch::Receiver<Gateway> {
    fn current_gateway(&self) -> Gateway {
        *self.borrow()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerContext {
    pub battle_tag: BattleTag,
    pub opponent_tag: Option<String>,
    pub selected_season: Option<Season>,
    pub game_mode: GameMode,
    /// Zero-based page index.
    pub page: u32,
}

impl PlayerContext {
    /// Returns whether the tag changed. A new tag always drops the selected season.
    pub fn set_battle_tag(&mut self, battle_tag: BattleTag) -> bool {
        if self.battle_tag == battle_tag {
            return false;
        }
        self.battle_tag = battle_tag;
        self.selected_season = None;
        true
    }

    pub fn set_opponent_tag(&mut self, opponent_tag: Option<String>) {
        self.opponent_tag = opponent_tag
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty());
    }

    pub fn set_season(&mut self, season: Option<Season>) {
        self.selected_season = season;
    }

    pub fn set_game_mode(&mut self, game_mode: GameMode) {
        self.game_mode = game_mode;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    /// Stores a 1-based page number as the 0-based index. Numbers below one are ignored.
    pub fn set_page_number(&mut self, page_number: i64) -> bool {
        if page_number < 1 {
            return false;
        }
        match u32::try_from(page_number - 1) {
            Ok(page) => {
                self.page = page;
                true
            }
            Err(_) => false,
        }
    }

    pub fn has_player(&self) -> bool {
        !self.battle_tag.is_empty()
    }

    pub fn match_scope(&self, gateway: Gateway) -> MatchScope {
        MatchScope {
            battle_tag: self.battle_tag.clone(),
            opponent_tag: self.opponent_tag.clone(),
            game_mode: self.game_mode,
            gateway,
            page: self.page,
        }
    }

    pub fn season_scope(&self, gateway: Option<Gateway>) -> Option<SeasonScope> {
        self.selected_season.map(|season| SeasonScope {
            battle_tag: self.battle_tag.clone(),
            season,
            gateway,
        })
    }
}

/// Context a match page request was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScope {
    pub battle_tag: BattleTag,
    pub opponent_tag: Option<String>,
    pub game_mode: GameMode,
    pub gateway: Gateway,
    pub page: u32,
}

impl MatchScope {
    pub fn is_current(&self, context: &PlayerContext, gateway: Gateway) -> bool {
        *self == context.match_scope(gateway)
    }
}

/// Context a per-season stats request was issued under. `gateway` is `None` for
/// datasets that are not split by region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonScope {
    pub battle_tag: BattleTag,
    pub season: Season,
    pub gateway: Option<Gateway>,
}

impl SeasonScope {
    pub fn is_current(&self, context: &PlayerContext, gateway: Gateway) -> bool {
        self.battle_tag == context.battle_tag
            && context.selected_season == Some(self.season)
            && self.gateway.map_or(true, |issued| issued == gateway)
    }
}

/// Parses a page number taken from a route or query string.
pub fn parse_page_param(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
