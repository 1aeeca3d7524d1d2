use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{
    config::load_settings, http::HttpPlayerApi, FixedGateway, MatchQuery, PlayerCoordinator,
};
use shared::domain::{BattleTag, GameMode, Gateway, Season};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Load a player's profile, stats and match history and print them as JSON")]
struct Args {
    /// Player to load, e.g. `Foo#1234`.
    battle_tag: String,
    #[arg(long)]
    api_url: Option<String>,
    /// Region name or numeric gateway id.
    #[arg(long)]
    gateway: Option<String>,
    #[arg(long, default_value = "1v1")]
    game_mode: String,
    /// 1-based page of match history.
    #[arg(long, default_value_t = 1)]
    page: i64,
    #[arg(long)]
    season: Option<u32>,
    #[arg(long)]
    opponent: Option<String>,
    /// Also look up the player's live match.
    #[arg(long)]
    ongoing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = &args.api_url {
        settings.api_base_url = client_core::config::normalize_api_base_url(api_url);
    }
    if let Some(raw) = &args.gateway {
        settings.gateway =
            Gateway::parse(raw).ok_or_else(|| anyhow!("unknown gateway {raw}"))?;
    }
    let game_mode =
        GameMode::parse(&args.game_mode).ok_or_else(|| anyhow!("unknown game mode {}", args.game_mode))?;

    let api = Arc::new(HttpPlayerApi::from_settings(&settings).context("build http client")?);
    let coordinator = PlayerCoordinator::with_page_size(
        api.clone(),
        api.clone(),
        Arc::new(FixedGateway(settings.gateway)),
        api.page_size(),
    );

    let battle_tag = BattleTag::new(args.battle_tag);
    info!(
        "player: loading name={} gateway={:?}",
        battle_tag.name(),
        settings.gateway
    );
    coordinator
        .load_profile(battle_tag.clone())
        .await
        .context("load profile")?;
    if let Some(season) = args.season {
        coordinator
            .set_season(Season { id: season })
            .await
            .context("select season")?;
    }
    coordinator.set_opponent_tag(args.opponent).await;
    coordinator.set_game_mode(game_mode).await;

    coordinator.reload_player().await.context("reload player")?;
    if args.page != 1 {
        coordinator
            .load_matches(MatchQuery::new(game_mode).page(args.page))
            .await
            .context("load matches")?;
    }
    coordinator
        .load_race_versus_race_on_map(&battle_tag)
        .await
        .context("load race versus race stats")?;
    if args.ongoing {
        coordinator
            .load_ongoing_match(battle_tag.as_str())
            .await
            .context("load ongoing match")?;
    }

    let state = coordinator.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&state)?);

    Ok(())
}
