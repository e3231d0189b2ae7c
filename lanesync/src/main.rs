use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use lanesync::config::Config;
use lanesync::feedback::{notice_for, Action};
use lanesync::load_options::{LoadOptionUpdate, LoadOptions};
use lanesync::notify::{Notifier, ToastNotifier};
use lanesync::outcome::Outcome;
use lanesync::state_manager::{DashboardState, StateHandle};
use lanesync::sync::ConfigSync;
use lanesync::transport::HttpTransport;

enum Command {
    Save,
    Load,
    SaveAndLoad,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "save" => Ok(Command::Save),
            "load" => Ok(Command::Load),
            "save-load" => Ok(Command::SaveAndLoad),
            other => bail!("unknown command {:?} (expected save, load or save-load)", other),
        }
    }
}

const USAGE: &str = "usage: lanesync <config.toml> <save|load|save-load> [key=value ...]";

/// Parsed command line.
struct Invocation {
    config_path: String,
    command: Command,
    updates: Vec<LoadOptionUpdate>,
}

impl Invocation {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let config_path = args.next().context(USAGE)?;
        if config_path.parse::<Command>().is_ok() {
            bail!("Missing config path before {:?}\n{}", config_path, USAGE);
        }
        let command = args.next().context(USAGE)?.parse()?;
        let updates = args
            .map(|arg| arg.parse::<LoadOptionUpdate>())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config_path,
            command,
            updates,
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lanesync=info"))
        )
        .init();

    let Invocation {
        config_path,
        command,
        updates,
    } = Invocation::parse(std::env::args().skip(1))?;

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!("Loaded config from {}", config_path);

    // Open the local state store
    let (state, mut fingerprint) = StateHandle::open(&config.state.db_path)?;
    tracing::info!("Opened state database at {:?}", config.state.db_path);

    if state.load_nodes().await?.is_empty() && !config.nodes.is_empty() {
        state.replace_nodes(config.nodes.clone()).await?;
        tracing::info!("Seeded {} nodes from config", config.nodes.len());
    }
    if let Some(user) = &config.dashboard.user {
        if state.load_current_user().await?.is_none() {
            state.store_current_user(user.clone()).await?;
        }
    }
    tracing::info!("State fingerprint: {}", *fingerprint.borrow_and_update());

    // Load target: configured node, else the default node, edited by command-line options
    let base = match &config.load {
        Some(node) => node.clone(),
        None => state.default_node().await.unwrap_or_default(),
    };
    let target = updates
        .into_iter()
        .fold(LoadOptions::from_node(&base), |options, update| options.apply(update))
        .descriptor();

    let sync = ConfigSync::new(Arc::new(HttpTransport::new()));
    let notifier = ToastNotifier::new(config.notifications.display_for());

    let outcomes = match command {
        Command::Save => vec![(Action::Save, sync.save(&state).await)],
        Command::Load => vec![(Action::Load, sync.load(&target, &state).await)],
        Command::SaveAndLoad => {
            let result = sync.save_and_load(&target, &state).await;
            vec![(Action::Save, result.save), (Action::Load, result.load)]
        }
    };

    for (action, outcome) in &outcomes {
        notifier.notify(*action, notice_for(*action, outcome));
    }

    // Keep the notices up until they expire or the operator interrupts
    let toasts = notifier.open();
    let all_closed = async {
        for toast in &toasts {
            toast.closed().await;
        }
    };
    tokio::select! {
        _ = all_closed => {}
        _ = tokio::signal::ctrl_c() => {
            for toast in &toasts {
                toast.dismiss();
            }
        }
    }

    if fingerprint.has_changed().unwrap_or(false) {
        tracing::info!("State fingerprint now {}", *fingerprint.borrow_and_update());
    }

    if let Err(e) = state.shutdown().await {
        tracing::error!("Failed to shutdown state store: {}", e);
    }

    let failed = outcomes
        .iter()
        .any(|(_, outcome)| matches!(outcome, Outcome::Failure(_)));
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_parse_invocation() {
        let invocation =
            Invocation::parse(args(&["lanes.toml", "save-load", "port=9000"])).unwrap();

        assert_eq!(invocation.config_path, "lanes.toml");
        assert!(matches!(invocation.command, Command::SaveAndLoad));
        assert_eq!(invocation.updates, vec![LoadOptionUpdate::Port(9000)]);
    }

    #[test]
    fn test_command_without_config_path() {
        let err = Invocation::parse(args(&["save"])).err().unwrap();

        assert!(err.to_string().contains("Missing config path"), "{}", err);
    }

    #[test]
    fn test_missing_command() {
        assert!(Invocation::parse(args(&["lanes.toml"])).is_err());
        assert!(Invocation::parse(Vec::new()).is_err());
    }
}
