//! # rudder-agent
//!
//! Rudder command-line client. Bootstraps a navigation session against a
//! content server, walks the given locations, optionally steps back through
//! history and invokes an action, and prints what would be rendered at each
//! step.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rudder_nav::{
    ContentView, History, HttpFetcher, JsonStreamDecoder, MemoryHistory, NavigateOptions,
    NavigationController, NavigationOutcome, RouterHandle,
};
use rudder_settings::RudderSettings;
use serde_json::Value;
use tracing::{info, warn};

/// Rudder navigation client.
#[derive(Parser, Debug)]
#[command(name = "rudder", about = "Drive a navigation session against a content server")]
struct Cli {
    /// Location loaded first.
    #[arg(long, default_value = "/")]
    start: String,

    /// Locations to navigate to, in order.
    locations: Vec<String>,

    /// Content server origin (overrides settings).
    #[arg(long)]
    base_url: Option<String>,

    /// Settings file to load instead of `~/.rudder/settings.json`.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter (overrides settings; `RUST_LOG` wins over both).
    #[arg(long)]
    log_level: Option<String>,

    /// Steps to go back after the navigations.
    #[arg(long, default_value_t = 0)]
    back: usize,

    /// Action to invoke from the final location.
    #[arg(long)]
    action: Option<String>,

    /// JSON argument for the action; repeatable.
    #[arg(long = "arg", requires = "action")]
    args: Vec<String>,
}

impl Cli {
    fn resolve_settings(&self) -> Result<RudderSettings> {
        let loaded = match &self.settings {
            Some(path) => rudder_settings::reload_settings_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => rudder_settings::get_settings(),
        };
        let mut settings = RudderSettings::clone(&loaded);
        if let Some(url) = &self.base_url {
            settings.server.base_url.clone_from(url);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        Ok(settings)
    }

    fn action_args(&self) -> Result<Vec<Value>> {
        self.args
            .iter()
            .map(|raw| {
                serde_json::from_str(raw).with_context(|| format!("Invalid JSON argument: {raw}"))
            })
            .collect()
    }
}

fn print_view(location: &str, view: &ContentView) -> Result<()> {
    match view {
        ContentView::Ready(content) => {
            println!("{location}\n{}", serde_json::to_string_pretty(&content.root)?);
        }
        ContentView::Failed { message, error } => {
            warn!(location, error = %error, "content failed to render");
            println!("{location}\n{message}");
        }
        ContentView::Loading => println!("{location}\n(loading)"),
    }
    Ok(())
}

async fn show(handle: &RouterHandle) -> Result<()> {
    let view = handle.resolve_view().await;
    print_view(&handle.location(), &view)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;
    rudder_core::logging::init_subscriber(&settings.logging.level);
    let action_args = cli.action_args()?;

    let fetcher = HttpFetcher::new(settings.server.clone()).context("Failed to build HTTP client")?;
    let (history, mut pop_rx) = MemoryHistory::new(cli.start.clone());
    let history = Arc::new(history);
    let controller = NavigationController::builder(
        Arc::clone(&history) as Arc<dyn History>,
        Arc::new(fetcher),
        Arc::new(JsonStreamDecoder::new()),
    )
    .settings(settings.navigation.clone())
    .bootstrap();
    let handle = controller.handle();
    info!(base_url = %settings.server.base_url, start = %cli.start, "session started");
    show(&handle).await?;

    for location in &cli.locations {
        let outcome = controller
            .navigate(location.clone(), NavigateOptions::default())
            .await
            .context("Navigation task failed")?
            .with_context(|| format!("Failed to navigate to {location}"))?;
        if outcome == NavigationOutcome::Superseded {
            bail!("navigation to {location} was superseded");
        }
        show(&handle).await?;
    }

    for _ in 0..cli.back {
        if !history.back() {
            warn!("no earlier history entry");
            break;
        }
        let event = pop_rx
            .recv()
            .await
            .context("History closed before traversal")?;
        let _ = controller
            .handle_pop_state(event)
            .await
            .context("Traversal task failed")??;
        show(&handle).await?;
    }

    if let Some(action) = &cli.action {
        let value = handle
            .call_action(action, &action_args)
            .await
            .with_context(|| format!("Action {action} failed"))?;
        println!("{}", serde_json::to_string_pretty(&value.unwrap_or(Value::Null))?);
    }

    Ok(())
}
