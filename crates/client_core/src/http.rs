//! reqwest implementation of the profile and match services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        BattleTag, GameMode, Gateway, Match, MatchPage, ModeStat, PlayerProfile, RaceStat,
        RaceVersusRaceOnMap,
    },
    error::TransportError,
    protocol::{MatchSearchQuery, MatchesResponse, SeasonQuery, SeasonStatsQuery},
};
use tracing::debug;
use url::Url;

use crate::{config::Settings, MatchService, ProfileService};

#[derive(Clone)]
pub struct HttpPlayerApi {
    http: Client,
    base_url: Url,
    page_size: usize,
}

impl HttpPlayerApi {
    pub fn new(
        base_url: &str,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url).map_err(|err| {
            TransportError::request(format!("invalid base url {base_url}: {err}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::request(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::request(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            page_size: page_size.max(1),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, TransportError> {
        Self::new(
            &settings.api_base_url,
            settings.page_size,
            settings.request_timeout(),
        )
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Appends percent-encoded path segments, so `Foo#123` becomes `Foo%23123`.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|err| TransportError::request(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::status(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ProfileService for HttpPlayerApi {
    async fn retrieve_profile(
        &self,
        battle_tag: &BattleTag,
    ) -> Result<PlayerProfile, TransportError> {
        let url = self.endpoint(&["players", battle_tag.as_str()]);
        self.send_json(self.http.get(url)).await
    }

    async fn retrieve_game_mode_stats(
        &self,
        battle_tag: &BattleTag,
        gateway: Gateway,
        season_id: u32,
    ) -> Result<Vec<ModeStat>, TransportError> {
        let url = self.endpoint(&["players", battle_tag.as_str(), "game-mode-stats"]);
        let query = SeasonStatsQuery {
            gateway,
            season: season_id,
        };
        self.send_json(self.http.get(url).query(&query)).await
    }

    async fn retrieve_race_stats(
        &self,
        battle_tag: &BattleTag,
        gateway: Gateway,
        season_id: u32,
    ) -> Result<Vec<RaceStat>, TransportError> {
        let url = self.endpoint(&["players", battle_tag.as_str(), "race-stats"]);
        let query = SeasonStatsQuery {
            gateway,
            season: season_id,
        };
        self.send_json(self.http.get(url).query(&query)).await
    }

    async fn retrieve_player_stats_race_versus_race_on_map(
        &self,
        battle_tag: &BattleTag,
        season_id: u32,
    ) -> Result<RaceVersusRaceOnMap, TransportError> {
        let url = self.endpoint(&[
            "player-stats",
            battle_tag.as_str(),
            "race-on-map-versus-race",
        ]);
        let query = SeasonQuery { season: season_id };
        self.send_json(self.http.get(url).query(&query)).await
    }
}

#[async_trait]
impl MatchService for HttpPlayerApi {
    async fn retrieve_player_matches(
        &self,
        page: u32,
        battle_tag: &BattleTag,
        opponent_tag: Option<&str>,
        game_mode: GameMode,
        gateway: Gateway,
    ) -> Result<MatchPage, TransportError> {
        let url = self.endpoint(&["matches", "search"]);
        let query = MatchSearchQuery {
            player_id: battle_tag.as_str().to_string(),
            gateway,
            offset: u64::from(page) * self.page_size as u64,
            page_size: u32::try_from(self.page_size).unwrap_or(u32::MAX),
            game_mode,
            opponent_id: opponent_tag.map(str::to_string),
        };
        let response: MatchesResponse = self.send_json(self.http.get(url).query(&query)).await?;
        Ok(response.into())
    }

    /// The backend answers "no match" with 204, 404, `null` or `{}`.
    async fn retrieve_ongoing_player_match(
        &self,
        player_id: &str,
    ) -> Result<Option<Match>, TransportError> {
        let url = self.endpoint(&["matches", "ongoing", player_id]);
        let response = match self.send(self.http.get(url)).await {
            Ok(response) => response,
            Err(TransportError::Status { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Ok(None)
            }
            Err(err) => return Err(err),
        };
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        let raw = body.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|err| TransportError::Decode(err.to_string()))?;
        let empty = value.is_null() || value.as_object().is_some_and(|obj| obj.is_empty());
        if empty {
            debug!("matches: no ongoing match player_id={player_id}");
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
