use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{
        BattleTag, GameMode, Gateway, Match, MatchPage, ModeStat, PlayerProfile, RaceStat,
        RaceVersusRaceOnMap, Season,
    },
    error::TransportError,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod http;
pub mod store;

pub use context::{parse_page_param, FixedGateway, GatewaySource, PlayerContext};
pub use error::PlayerError;
pub use store::{LoadOutcome, PlayerEvent, PlayerState, PlayerStore, StateGroup};

use error::Result;
use store::Dataset;

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn retrieve_profile(
        &self,
        battle_tag: &BattleTag,
    ) -> std::result::Result<PlayerProfile, TransportError>;
    async fn retrieve_game_mode_stats(
        &self,
        battle_tag: &BattleTag,
        gateway: Gateway,
        season_id: u32,
    ) -> std::result::Result<Vec<ModeStat>, TransportError>;
    async fn retrieve_race_stats(
        &self,
        battle_tag: &BattleTag,
        gateway: Gateway,
        season_id: u32,
    ) -> std::result::Result<Vec<RaceStat>, TransportError>;
    async fn retrieve_player_stats_race_versus_race_on_map(
        &self,
        battle_tag: &BattleTag,
        season_id: u32,
    ) -> std::result::Result<RaceVersusRaceOnMap, TransportError>;
}

#[async_trait]
pub trait MatchService: Send + Sync {
    /// `page` is zero-based.
    async fn retrieve_player_matches(
        &self,
        page: u32,
        battle_tag: &BattleTag,
        opponent_tag: Option<&str>,
        game_mode: GameMode,
        gateway: Gateway,
    ) -> std::result::Result<MatchPage, TransportError>;
    /// `Ok(None)` when the player is not in a game.
    async fn retrieve_ongoing_player_match(
        &self,
        player_id: &str,
    ) -> std::result::Result<Option<Match>, TransportError>;
}

pub struct MissingProfileService;

#[async_trait]
impl ProfileService for MissingProfileService {
    async fn retrieve_profile(
        &self,
        battle_tag: &BattleTag,
    ) -> std::result::Result<PlayerProfile, TransportError> {
        Err(TransportError::request(format!(
            "profile service unavailable for {battle_tag}"
        )))
    }

    async fn retrieve_game_mode_stats(
        &self,
        battle_tag: &BattleTag,
        _gateway: Gateway,
        _season_id: u32,
    ) -> std::result::Result<Vec<ModeStat>, TransportError> {
        Err(TransportError::request(format!(
            "profile service unavailable for {battle_tag}"
        )))
    }

    async fn retrieve_race_stats(
        &self,
        battle_tag: &BattleTag,
        _gateway: Gateway,
        _season_id: u32,
    ) -> std::result::Result<Vec<RaceStat>, TransportError> {
        Err(TransportError::request(format!(
            "profile service unavailable for {battle_tag}"
        )))
    }

    async fn retrieve_player_stats_race_versus_race_on_map(
        &self,
        battle_tag: &BattleTag,
        _season_id: u32,
    ) -> std::result::Result<RaceVersusRaceOnMap, TransportError> {
        Err(TransportError::request(format!(
            "profile service unavailable for {battle_tag}"
        )))
    }
}

pub struct MissingMatchService;

#[async_trait]
impl MatchService for MissingMatchService {
    async fn retrieve_player_matches(
        &self,
        _page: u32,
        battle_tag: &BattleTag,
        _opponent_tag: Option<&str>,
        _game_mode: GameMode,
        _gateway: Gateway,
    ) -> std::result::Result<MatchPage, TransportError> {
        Err(TransportError::request(format!(
            "match service unavailable for {battle_tag}"
        )))
    }

    async fn retrieve_ongoing_player_match(
        &self,
        player_id: &str,
    ) -> std::result::Result<Option<Match>, TransportError> {
        Err(TransportError::request(format!(
            "match service unavailable for {player_id}"
        )))
    }
}

/// Arguments of [`PlayerCoordinator::load_matches`]. `page` is the 1-based number shown to
/// users; anything below one leaves the stored page untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchQuery {
    pub page: Option<i64>,
    pub game_mode: GameMode,
}

impl MatchQuery {
    pub fn new(game_mode: GameMode) -> Self {
        Self {
            page: None,
            game_mode,
        }
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Builds a query from a raw route parameter; unparseable input means "keep the current page".
    pub fn from_param(page: &str, game_mode: GameMode) -> Self {
        Self {
            page: parse_page_param(page),
            game_mode,
        }
    }
}

/// Sequences player fetches and commits their results into the owned [`PlayerStore`].
pub struct PlayerCoordinator {
    profiles: Arc<dyn ProfileService>,
    matches: Arc<dyn MatchService>,
    gateway: Arc<dyn GatewaySource>,
    store: PlayerStore,
    page_size: usize,
}

impl PlayerCoordinator {
    pub fn new(
        profiles: Arc<dyn ProfileService>,
        matches: Arc<dyn MatchService>,
        gateway: Arc<dyn GatewaySource>,
    ) -> Arc<Self> {
        Self::with_page_size(profiles, matches, gateway, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        profiles: Arc<dyn ProfileService>,
        matches: Arc<dyn MatchService>,
        gateway: Arc<dyn GatewaySource>,
        page_size: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            profiles,
            matches,
            gateway,
            store: PlayerStore::new(),
            page_size: page_size.max(1),
        })
    }

    pub fn unconfigured(gateway: Gateway) -> Arc<Self> {
        Self::new(
            Arc::new(MissingProfileService),
            Arc::new(MissingMatchService),
            Arc::new(FixedGateway(gateway)),
        )
    }

    pub async fn snapshot(&self) -> PlayerState {
        self.store.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.store.subscribe()
    }

    fn current_gateway(&self) -> Gateway {
        self.gateway.current_gateway()
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!("player: load failed error={err}");
            self.store.notify_failure(err);
        }
        result
    }

    pub async fn set_battle_tag(&self, battle_tag: impl Into<BattleTag>) -> bool {
        self.store.set_battle_tag(battle_tag.into()).await
    }

    pub async fn set_opponent_tag(&self, opponent_tag: Option<String>) {
        self.store.set_opponent_tag(opponent_tag).await
    }

    pub async fn set_season(&self, season: Season) -> Result<()> {
        self.store.set_season(season).await
    }

    pub async fn set_game_mode(&self, game_mode: GameMode) {
        self.store.set_game_mode(game_mode).await
    }

    pub async fn set_page(&self, page: u32) {
        self.store.set_page(page).await
    }

    /// Loads the profile for `battle_tag`, adopting it as the current player first,
    /// and selects the first season the player took part in.
    pub async fn load_profile(&self, battle_tag: impl Into<BattleTag>) -> Result<LoadOutcome> {
        let battle_tag = battle_tag.into();
        self.store.set_battle_tag(battle_tag.clone()).await;

        let ticket = self.store.begin_profile_load().await;
        let result = fetch::fetch_profile(self.profiles.as_ref(), &battle_tag).await;
        let outcome = match result {
            Ok(profile) => {
                let seasons = profile.participated_in_seasons.len();
                let outcome = self.store.commit_profile(ticket, &battle_tag, profile).await;
                info!(
                    "player: profile loaded battle_tag={battle_tag} seasons={seasons} outcome={outcome:?}"
                );
                Ok(outcome)
            }
            Err(err) => Err(err),
        };
        self.store.end_profile_load(ticket).await;
        self.report(outcome)
    }

    /// Refreshes per-mode stats for the selected season. `battle_tag` overrides the
    /// stored player for the fetch only.
    pub async fn load_game_mode_stats(
        &self,
        battle_tag: Option<&BattleTag>,
    ) -> Result<LoadOutcome> {
        let gateway = self.current_gateway();
        let Some((ticket, scope)) = self
            .store
            .begin_season_load(Dataset::ModeStats, Some(gateway))
            .await
        else {
            return Ok(LoadOutcome::Skipped);
        };
        let target = battle_tag.unwrap_or(&scope.battle_tag);
        let result =
            fetch::fetch_mode_stats(self.profiles.as_ref(), target, gateway, scope.season.id).await;
        let result = match result {
            Ok(stats) => Ok(self
                .store
                .commit_mode_stats(ticket, &scope, self.current_gateway(), stats)
                .await),
            Err(err) => Err(err),
        };
        self.report(result)
    }

    pub async fn load_race_stats(&self) -> Result<LoadOutcome> {
        let gateway = self.current_gateway();
        let Some((ticket, scope)) = self
            .store
            .begin_season_load(Dataset::RaceStats, Some(gateway))
            .await
        else {
            return Ok(LoadOutcome::Skipped);
        };
        let result = fetch::fetch_race_stats(
            self.profiles.as_ref(),
            &scope.battle_tag,
            gateway,
            scope.season.id,
        )
        .await;
        let result = match result {
            Ok(stats) => Ok(self
                .store
                .commit_race_stats(ticket, &scope, self.current_gateway(), stats)
                .await),
            Err(err) => Err(err),
        };
        self.report(result)
    }

    pub async fn load_race_versus_race_on_map(
        &self,
        battle_tag: &BattleTag,
    ) -> Result<LoadOutcome> {
        let Some((ticket, scope)) = self
            .store
            .begin_season_load(Dataset::RaceVersusRace, None)
            .await
        else {
            return Ok(LoadOutcome::Skipped);
        };
        let result = fetch::fetch_race_versus_race_on_map(
            self.profiles.as_ref(),
            battle_tag,
            scope.season.id,
        )
        .await;
        let result = match result {
            Ok(matrix) => Ok(self
                .store
                .commit_race_versus_race(ticket, &scope, self.current_gateway(), matrix)
                .await),
            Err(err) => Err(err),
        };
        self.report(result)
    }

    /// Loads one page of match history for the current context. Only the most
    /// recently issued call may commit its page.
    pub async fn load_matches(&self, query: MatchQuery) -> Result<LoadOutcome> {
        let (ticket, scope) = self
            .store
            .begin_match_load(query.page, query.game_mode, self.current_gateway())
            .await;

        let result = fetch::fetch_match_page(
            self.matches.as_ref(),
            scope.page,
            &scope.battle_tag,
            scope.opponent_tag.as_deref(),
            scope.game_mode,
            scope.gateway,
            self.page_size,
        )
        .await;
        let result = match result {
            Ok(page) => {
                let count = page.count;
                let outcome = self
                    .store
                    .commit_matches(ticket, &scope, self.current_gateway(), page)
                    .await;
                info!(
                    "matches: page loaded battle_tag={} page={} total={} outcome={:?}",
                    scope.battle_tag, scope.page, count, outcome
                );
                Ok(outcome)
            }
            Err(err) => Err(err),
        };
        self.store.end_match_load(ticket).await;
        self.report(result)
    }

    pub async fn load_ongoing_match(&self, player_id: &str) -> Result<LoadOutcome> {
        let ticket = self.store.begin_ongoing_match_load().await;
        let result = match fetch::fetch_ongoing_match(self.matches.as_ref(), player_id).await {
            Ok(ongoing) => Ok(self.store.commit_ongoing_match(ticket, ongoing).await),
            Err(err) => Err(err),
        };
        self.report(result)
    }

    /// Resets paging and, when a player is selected, reloads matches, race stats and
    /// mode stats in that order.
    pub async fn reload_player(&self) -> Result<()> {
        self.store.set_page(0).await;

        let context = self.store.context().await;
        if !context.has_player() {
            return Ok(());
        }

        self.load_matches(MatchQuery::new(context.game_mode).page(1))
            .await?;
        self.load_race_stats().await?;
        self.load_game_mode_stats(None).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
