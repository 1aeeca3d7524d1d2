//! Owned player state plus the request bookkeeping that keeps it consistent.
//!
//! Every mutation takes the lock once and assigns one field group, so a
//! snapshot never shows a half-applied update. Fetched data is committed
//! through a [`RequestTicket`]; a ticket that is no longer the latest for its
//! dataset, or whose scope no longer matches the context, is discarded.

use serde::Serialize;
use shared::domain::{
    BattleTag, GameMode, Gateway, Match, MatchPage, ModeStat, OngoingMatch, PlayerProfile,
    RaceStat, RaceVersusRaceOnMap, Season,
};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::{
    context::{MatchScope, PlayerContext, SeasonScope},
    error::{PlayerError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Profile,
    ModeStats,
    RaceStats,
    RaceVersusRace,
    Matches,
    OngoingMatch,
}

const DATASET_COUNT: usize = 6;
const SEASON_DATASETS: [Dataset; 3] = [
    Dataset::ModeStats,
    Dataset::RaceStats,
    Dataset::RaceVersusRace,
];
const ALL_DATASETS: [Dataset; DATASET_COUNT] = [
    Dataset::Profile,
    Dataset::ModeStats,
    Dataset::RaceStats,
    Dataset::RaceVersusRace,
    Dataset::Matches,
    Dataset::OngoingMatch,
];

/// Handle for one in-flight fetch. Only the most recently issued ticket of a dataset may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub dataset: Dataset,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Committed,
    /// The response arrived after a newer request or a context change and was dropped.
    Stale,
    /// Preconditions were not met, so nothing was fetched.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateGroup {
    Context,
    Profile,
    LoadingProfile,
    ModeStats,
    RaceStats,
    RaceVersusRace,
    Matches,
    LoadingMatches,
    OngoingMatch,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    StateChanged(StateGroup),
    LoadFailed {
        operation: &'static str,
        message: String,
    },
}

/// Snapshot of everything the player view renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerState {
    pub context: PlayerContext,
    pub profile: Option<PlayerProfile>,
    pub game_mode_stats: Vec<ModeStat>,
    pub race_stats: Vec<RaceStat>,
    pub race_versus_race_on_map: Option<RaceVersusRaceOnMap>,
    pub total_matches: u64,
    pub matches: Vec<Match>,
    pub ongoing_match: OngoingMatch,
    pub loading_profile: bool,
    pub loading_matches: bool,
}

impl PlayerState {
    fn clear_season_datasets(&mut self) {
        self.game_mode_stats.clear();
        self.race_stats.clear();
        self.race_versus_race_on_map = None;
    }

    fn clear_player_datasets(&mut self) {
        self.profile = None;
        self.clear_season_datasets();
        self.total_matches = 0;
        self.matches.clear();
        self.ongoing_match = OngoingMatch::None;
        self.loading_profile = false;
        self.loading_matches = false;
    }
}

#[derive(Default)]
struct StoreInner {
    state: PlayerState,
    issued: [u64; DATASET_COUNT],
}

impl StoreInner {
    fn issue(&mut self, dataset: Dataset) -> RequestTicket {
        let slot = &mut self.issued[dataset as usize];
        *slot += 1;
        RequestTicket {
            dataset,
            seq: *slot,
        }
    }

    fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.issued[ticket.dataset as usize] == ticket.seq
    }

    fn invalidate(&mut self, datasets: &[Dataset]) {
        for dataset in datasets {
            self.issued[*dataset as usize] += 1;
        }
    }

    /// Applies a season change and drops every dataset that was scoped to the old season.
    fn apply_season(&mut self, season: Option<Season>) -> bool {
        if self.state.context.selected_season == season {
            return false;
        }
        self.state.context.set_season(season);
        self.state.clear_season_datasets();
        self.invalidate(&SEASON_DATASETS);
        true
    }
}

pub struct PlayerStore {
    inner: Mutex<StoreInner>,
    events: broadcast::Sender<PlayerEvent>,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Mutex::new(StoreInner::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> PlayerState {
        self.inner.lock().await.state.clone()
    }

    pub async fn context(&self) -> PlayerContext {
        self.inner.lock().await.state.context.clone()
    }

    fn notify(&self, group: StateGroup) {
        let _ = self.events.send(PlayerEvent::StateChanged(group));
    }

    pub(crate) fn notify_failure(&self, err: &PlayerError) {
        let operation = match err {
            PlayerError::Transport { operation, .. } => *operation,
            _ => "player",
        };
        let _ = self.events.send(PlayerEvent::LoadFailed {
            operation,
            message: err.to_string(),
        });
    }

    /// Switching players resets the season and every dataset of the previous player,
    /// and orphans their in-flight requests.
    pub async fn set_battle_tag(&self, battle_tag: BattleTag) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.state.context.set_battle_tag(battle_tag) {
            return false;
        }
        inner.state.clear_player_datasets();
        inner.invalidate(&ALL_DATASETS);
        drop(inner);
        self.notify(StateGroup::Context);
        true
    }

    pub async fn set_opponent_tag(&self, opponent_tag: Option<String>) {
        let mut inner = self.inner.lock().await;
        let before = inner.state.context.opponent_tag.clone();
        inner.state.context.set_opponent_tag(opponent_tag);
        let changed = inner.state.context.opponent_tag != before;
        drop(inner);
        if changed {
            self.notify(StateGroup::Context);
        }
    }

    pub async fn set_game_mode(&self, game_mode: GameMode) {
        let mut inner = self.inner.lock().await;
        let changed = inner.state.context.game_mode != game_mode;
        inner.state.context.set_game_mode(game_mode);
        drop(inner);
        if changed {
            self.notify(StateGroup::Context);
        }
    }

    pub async fn set_page(&self, page: u32) {
        let mut inner = self.inner.lock().await;
        let changed = inner.state.context.page != page;
        inner.state.context.set_page(page);
        drop(inner);
        if changed {
            self.notify(StateGroup::Context);
        }
    }

    /// Selects one of the seasons listed in the loaded profile.
    pub async fn set_season(&self, season: Season) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let listed = match &inner.state.profile {
            None => return Err(PlayerError::NoProfile),
            Some(profile) => profile.participated_in_seasons.contains(&season),
        };
        if !listed {
            return Err(PlayerError::UnknownSeason {
                season_id: season.id,
            });
        }
        let changed = inner.apply_season(Some(season));
        drop(inner);
        if changed {
            self.notify(StateGroup::Context);
        }
        Ok(())
    }

    pub async fn begin_profile_load(&self) -> RequestTicket {
        let mut inner = self.inner.lock().await;
        let ticket = inner.issue(Dataset::Profile);
        inner.state.loading_profile = true;
        drop(inner);
        self.notify(StateGroup::LoadingProfile);
        ticket
    }

    /// Commits the profile and defaults the season to the first one it lists.
    pub async fn commit_profile(
        &self,
        ticket: RequestTicket,
        battle_tag: &BattleTag,
        profile: PlayerProfile,
    ) -> LoadOutcome {
        let mut inner = self.inner.lock().await;
        if !inner.is_latest(ticket) || inner.state.context.battle_tag != *battle_tag {
            debug!("player: discarded stale profile battle_tag={battle_tag}");
            return LoadOutcome::Stale;
        }
        let first_season = profile.participated_in_seasons.first().copied();
        inner.state.profile = Some(profile);
        inner.apply_season(first_season);
        drop(inner);
        self.notify(StateGroup::Profile);
        LoadOutcome::Committed
    }

    pub async fn end_profile_load(&self, ticket: RequestTicket) {
        let mut inner = self.inner.lock().await;
        if !inner.is_latest(ticket) {
            return;
        }
        inner.state.loading_profile = false;
        drop(inner);
        self.notify(StateGroup::LoadingProfile);
    }

    /// Issues a ticket for a per-season dataset, or `None` when no season is selected.
    pub async fn begin_season_load(
        &self,
        dataset: Dataset,
        gateway: Option<Gateway>,
    ) -> Option<(RequestTicket, SeasonScope)> {
        let mut inner = self.inner.lock().await;
        let scope = inner.state.context.season_scope(gateway)?;
        Some((inner.issue(dataset), scope))
    }

    async fn commit_season_dataset(
        &self,
        ticket: RequestTicket,
        scope: &SeasonScope,
        gateway: Gateway,
        group: StateGroup,
        apply: impl FnOnce(&mut PlayerState),
    ) -> LoadOutcome {
        let mut inner = self.inner.lock().await;
        if !inner.is_latest(ticket) || !scope.is_current(&inner.state.context, gateway) {
            debug!(
                "player: discarded stale {:?} battle_tag={} season={}",
                ticket.dataset, scope.battle_tag, scope.season.id
            );
            return LoadOutcome::Stale;
        }
        apply(&mut inner.state);
        drop(inner);
        self.notify(group);
        LoadOutcome::Committed
    }

    pub async fn commit_mode_stats(
        &self,
        ticket: RequestTicket,
        scope: &SeasonScope,
        gateway: Gateway,
        stats: Vec<ModeStat>,
    ) -> LoadOutcome {
        self.commit_season_dataset(ticket, scope, gateway, StateGroup::ModeStats, |state| {
            state.game_mode_stats = stats
        })
        .await
    }

    pub async fn commit_race_stats(
        &self,
        ticket: RequestTicket,
        scope: &SeasonScope,
        gateway: Gateway,
        stats: Vec<RaceStat>,
    ) -> LoadOutcome {
        self.commit_season_dataset(ticket, scope, gateway, StateGroup::RaceStats, |state| {
            state.race_stats = stats
        })
        .await
    }

    pub async fn commit_race_versus_race(
        &self,
        ticket: RequestTicket,
        scope: &SeasonScope,
        gateway: Gateway,
        matrix: RaceVersusRaceOnMap,
    ) -> LoadOutcome {
        self.commit_season_dataset(
            ticket,
            scope,
            gateway,
            StateGroup::RaceVersusRace,
            |state| state.race_versus_race_on_map = Some(matrix),
        )
        .await
    }

    /// Applies the requested page number and game mode, raises the loading flag and
    /// captures the scope the fetch must use, all under one lock.
    pub async fn begin_match_load(
        &self,
        page_number: Option<i64>,
        game_mode: GameMode,
        gateway: Gateway,
    ) -> (RequestTicket, MatchScope) {
        let mut inner = self.inner.lock().await;
        if let Some(page_number) = page_number {
            if !inner.state.context.set_page_number(page_number) {
                debug!("matches: ignored invalid page number page={page_number}");
            }
        }
        inner.state.context.set_game_mode(game_mode);
        inner.state.loading_matches = true;
        let ticket = inner.issue(Dataset::Matches);
        let scope = inner.state.context.match_scope(gateway);
        drop(inner);
        self.notify(StateGroup::Context);
        self.notify(StateGroup::LoadingMatches);
        (ticket, scope)
    }

    pub async fn commit_matches(
        &self,
        ticket: RequestTicket,
        scope: &MatchScope,
        gateway: Gateway,
        page: MatchPage,
    ) -> LoadOutcome {
        let mut inner = self.inner.lock().await;
        if !inner.is_latest(ticket) || !scope.is_current(&inner.state.context, gateway) {
            debug!(
                "matches: discarded stale page seq={} battle_tag={} page={} game_mode={:?}",
                ticket.seq, scope.battle_tag, scope.page, scope.game_mode
            );
            return LoadOutcome::Stale;
        }
        inner.state.total_matches = page.count;
        inner.state.matches = page.matches;
        drop(inner);
        self.notify(StateGroup::Matches);
        LoadOutcome::Committed
    }

    pub async fn end_match_load(&self, ticket: RequestTicket) {
        let mut inner = self.inner.lock().await;
        if !inner.is_latest(ticket) {
            return;
        }
        inner.state.loading_matches = false;
        drop(inner);
        self.notify(StateGroup::LoadingMatches);
    }

    pub async fn begin_ongoing_match_load(&self) -> RequestTicket {
        self.inner.lock().await.issue(Dataset::OngoingMatch)
    }

    pub async fn commit_ongoing_match(
        &self,
        ticket: RequestTicket,
        ongoing: OngoingMatch,
    ) -> LoadOutcome {
        let mut inner = self.inner.lock().await;
        if !inner.is_latest(ticket) {
            debug!("player: discarded stale ongoing match seq={}", ticket.seq);
            return LoadOutcome::Stale;
        }
        inner.state.ongoing_match = ongoing;
        drop(inner);
        self.notify(StateGroup::OngoingMatch);
        LoadOutcome::Committed
    }
}
