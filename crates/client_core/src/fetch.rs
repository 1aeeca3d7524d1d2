//! Read operations against the player and match services.
//!
//! These never touch the store; they return normalized data for the
//! coordinator to commit.

use shared::domain::{
    BattleTag, GameMode, Gateway, MatchPage, ModeStat, OngoingMatch, PlayerProfile, RaceStat,
    RaceVersusRaceOnMap,
};
use tracing::warn;

use crate::{
    error::{PlayerError, Result},
    MatchService, ProfileService,
};

pub async fn fetch_profile(
    service: &dyn ProfileService,
    battle_tag: &BattleTag,
) -> Result<PlayerProfile> {
    service
        .retrieve_profile(battle_tag)
        .await
        .map_err(PlayerError::transport("retrieve profile"))
}

pub async fn fetch_mode_stats(
    service: &dyn ProfileService,
    battle_tag: &BattleTag,
    gateway: Gateway,
    season_id: u32,
) -> Result<Vec<ModeStat>> {
    service
        .retrieve_game_mode_stats(battle_tag, gateway, season_id)
        .await
        .map_err(PlayerError::transport("retrieve game mode stats"))
}

pub async fn fetch_race_stats(
    service: &dyn ProfileService,
    battle_tag: &BattleTag,
    gateway: Gateway,
    season_id: u32,
) -> Result<Vec<RaceStat>> {
    service
        .retrieve_race_stats(battle_tag, gateway, season_id)
        .await
        .map_err(PlayerError::transport("retrieve race stats"))
}

pub async fn fetch_race_versus_race_on_map(
    service: &dyn ProfileService,
    battle_tag: &BattleTag,
    season_id: u32,
) -> Result<RaceVersusRaceOnMap> {
    service
        .retrieve_player_stats_race_versus_race_on_map(battle_tag, season_id)
        .await
        .map_err(PlayerError::transport("retrieve race versus race stats"))
}

/// Pages longer than `page_size` break the paging contract and are cut down to size.
pub async fn fetch_match_page(
    service: &dyn MatchService,
    page: u32,
    battle_tag: &BattleTag,
    opponent_tag: Option<&str>,
    game_mode: GameMode,
    gateway: Gateway,
    page_size: usize,
) -> Result<MatchPage> {
    let mut result = service
        .retrieve_player_matches(page, battle_tag, opponent_tag, game_mode, gateway)
        .await
        .map_err(PlayerError::transport("retrieve player matches"))?;

    if result.matches.len() > page_size {
        warn!(
            "matches: service returned oversized page battle_tag={} page={} len={} page_size={}",
            battle_tag,
            page,
            result.matches.len(),
            page_size
        );
        result.matches.truncate(page_size);
    }

    Ok(result)
}

pub async fn fetch_ongoing_match(
    service: &dyn MatchService,
    player_id: &str,
) -> Result<OngoingMatch> {
    let found = service
        .retrieve_ongoing_player_match(player_id)
        .await
        .map_err(PlayerError::transport("retrieve ongoing match"))?;
    Ok(OngoingMatch::from(found))
}
