//! CLI Command Handlers
//!
//! Implements all CLI commands on top of the player core.
//! Each handler takes CLI args and Output, returns ExitCode.

use embedplay::cli::{
    Cli, ExitCode, Output, ProviderRow, ResolveCmd, ResolveResponse, ScriptCmd, WalkCmd,
    WalkMove, WalkStep,
};
use embedplay::config::{Config, SourcesLocation};
use embedplay::models::{ContentKind, PlayerRoute};
use embedplay::player::guard::{injected_script, SurfaceSettings};
use embedplay::player::{
    build_url, CatalogError, EmbeddedSurface, PlayerNotice, PlayerSession, SourceCatalog,
    SurfaceEvent, SystemClock,
};
use embedplay::SourcesClient;
use std::time::Duration;
use tracing::info;

// =============================================================================
// Shared Helpers
// =============================================================================

/// Load config from `--config` or the default path
pub fn load_config(cli: &Cli) -> Config {
    match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Load the provider catalog from the resolved location
async fn load_catalog(
    cli: &Cli,
    config: &Config,
    output: &Output,
) -> Result<SourceCatalog, ExitCode> {
    let location =
        config.sources_location(cli.sources_file.as_deref(), cli.sources_url.as_deref());

    match location {
        SourcesLocation::File(path) => {
            output.info(format!("Loading sources from {}", path.display()));
            SourceCatalog::from_json_file(&path).map_err(|e| {
                output.error(format!("Failed to load sources: {:#}", e), ExitCode::Error)
            })
        }
        SourcesLocation::Url(url) => {
            output.info(format!("Fetching sources from {}", url));
            SourcesClient::with_url(url).fetch().await.map_err(|e| {
                output.error(
                    format!("Failed to fetch sources: {}", e),
                    ExitCode::NetworkError,
                )
            })
        }
    }
}

/// Resolve a provider argument (key or index) to an index
fn provider_index(catalog: &SourceCatalog, arg: Option<&str>) -> Option<usize> {
    let Some(arg) = arg else {
        return Some(0);
    };
    catalog
        .position(arg)
        .or_else(|| arg.parse::<usize>().ok().filter(|&i| i < catalog.len()))
}

// =============================================================================
// Sources Command
// =============================================================================

pub async fn sources_cmd(cli: &Cli, output: &Output) -> ExitCode {
    let config = load_config(cli);
    let catalog = match load_catalog(cli, &config, output).await {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let rows: Vec<ProviderRow> = catalog
        .iter()
        .enumerate()
        .map(|(index, p)| ProviderRow {
            index,
            key: p.key.clone(),
            name: p.name.clone(),
        })
        .collect();

    if let Err(e) = output.print(&rows) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: &ResolveCmd, cli: &Cli, output: &Output) -> ExitCode {
    let config = load_config(cli);
    let catalog = match load_catalog(cli, &config, output).await {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let Some(index) = provider_index(&catalog, cmd.provider.as_deref()) else {
        return output.error(
            format!("Unknown provider: {}", cmd.provider.as_deref().unwrap_or_default()),
            ExitCode::InvalidArgs,
        );
    };
    let Some(provider) = catalog.get(index) else {
        return output.error("Unknown provider", ExitCode::InvalidArgs);
    };

    let kind = ContentKind::from(cmd.kind);
    match build_url(provider, cmd.id, kind, cmd.season, cmd.episode) {
        Ok(url) => {
            let response = ResolveResponse {
                provider: provider.key.clone(),
                kind,
                url,
            };
            if output.json {
                if let Err(e) = output.print(&response) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else {
                output.print_raw(&response.url);
            }
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), ExitCode::SourceUnavailable),
    }
}

// =============================================================================
// Script Command
// =============================================================================

pub fn script_cmd(cmd: &ScriptCmd, cli: &Cli, output: &Output) -> ExitCode {
    let config = load_config(cli);
    let interval = cmd
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(config.player_options().popup_scan_interval);

    output.print_raw(&injected_script(interval));
    ExitCode::Success
}

// =============================================================================
// Walk Command
// =============================================================================

/// Surface that only records what it was asked to do
#[derive(Debug, Default)]
struct HeadlessSurface {
    current: Option<String>,
}

impl EmbeddedSurface for HeadlessSurface {
    fn configure(&mut self, settings: &SurfaceSettings) {
        info!(?settings, "surface configured");
    }

    fn load(&mut self, url: &str) {
        info!(url, "surface load");
        self.current = Some(url.to_string());
    }

    fn inject_script(&mut self, source: &str) {
        info!(bytes = source.len(), "surface script injected");
    }

    fn unload(&mut self) {
        info!("surface unloaded");
        self.current = None;
    }
}

pub async fn walk_cmd(cmd: &WalkCmd, cli: &Cli, output: &Output) -> ExitCode {
    let seasons = match cmd.parse_seasons() {
        Ok(seasons) => seasons,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let moves = cmd.parse_moves();
    if let Some(WalkMove::Invalid(m)) = moves.iter().find(|m| matches!(m, WalkMove::Invalid(_))) {
        return output.error(
            format!("Invalid move '{}' (expected next, prev, source:N, fail)", m),
            ExitCode::InvalidArgs,
        );
    }

    let config = load_config(cli);
    let catalog = match load_catalog(cli, &config, output).await {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let kind = ContentKind::from(cmd.kind);
    let title = format!("#{}", cmd.id);
    let route = match PlayerRoute::for_content(
        &catalog,
        cmd.id,
        kind,
        title,
        cmd.season,
        cmd.episode,
        seasons,
    ) {
        Ok(route) => route,
        Err(e @ CatalogError::InvalidTemplate { .. }) => {
            return output.error(e.to_string(), ExitCode::SourceUnavailable)
        }
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    let mut session = match PlayerSession::open(
        route,
        HeadlessSurface::default(),
        SystemClock,
        config.player_options(),
    ) {
        Ok(session) => session,
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    let mut steps = vec![walk_step("open", &session, None)];
    for m in moves {
        session.on_control_interaction();
        let (action, notice) = match m {
            WalkMove::Next => ("next".to_string(), session.next_episode()),
            WalkMove::Prev => ("prev".to_string(), session.previous_episode()),
            WalkMove::Source(index) => {
                (format!("source:{}", index), session.select_provider(index))
            }
            WalkMove::Fail => {
                let event = SurfaceEvent::new(session.selection().resolved_url.clone());
                ("fail".to_string(), session.on_surface_load_error(&event))
            }
            WalkMove::Invalid(_) => continue,
        };
        // Headless: every successful push counts as loaded
        if notice.is_none() {
            let event = SurfaceEvent::new(session.selection().resolved_url.clone());
            session.on_surface_load_complete(&event);
        }
        steps.push(walk_step(&action, &session, notice));
    }
    session.close();

    if let Err(e) = output.print(&steps) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

fn walk_step(
    action: &str,
    session: &PlayerSession<HeadlessSurface, SystemClock>,
    notice: Option<PlayerNotice>,
) -> WalkStep {
    WalkStep {
        action: action.to_string(),
        label: session.title_label(),
        source: session.current_source_name().to_string(),
        url: session.selection().resolved_url.clone(),
        notice,
    }
}
