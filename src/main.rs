use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use prefbridge::observability::init_tracing;
use prefbridge::signal::{FileWatchSignal, NoSignal, ReloadSignal};
use prefbridge::store::LiveStore;
use prefbridge::{Config, LocationContext, PreferenceFacade};

#[derive(Parser)]
#[command(name = "prefbridge")]
#[command(about = "Inspect preferences through the read-only bridge", long_about = None)]
struct Cli {
    /// Path to the config file (default: ~/.config/prefbridge/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preferences name (overrides paths.preferences_name)
    #[arg(short, long)]
    name: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a single key
    Get {
        key: String,
        /// Type to read the value as
        #[arg(long = "as", value_enum, default_value_t = ValueKind::String)]
        kind: ValueKind,
    },
    /// Print every entry of the authoritative source as JSON
    Dump,
    /// Print the preferences again after every change until Ctrl-C
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum ValueKind {
    Int,
    Long,
    Float,
    Bool,
    String,
    Set,
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let name = cli
        .name
        .clone()
        .unwrap_or_else(|| config.paths.preferences_name.clone());

    match cli.command {
        Commands::Get { key, kind } => {
            let facade = load_facade(&config, &name, &NoSignal)?;
            println!("{}", read_key(&facade, &key, kind)?);
        }
        Commands::Dump => {
            let facade = load_facade(&config, &name, &NoSignal)?;
            print_all(&facade)?;
        }
        Commands::Watch => watch(&config, &name).await?,
    }

    Ok(())
}

fn load_facade(config: &Config, name: &str, signal: &dyn ReloadSignal) -> Result<PreferenceFacade> {
    let facade = PreferenceFacade::new(config.layout.clone());
    let outcome = facade.load(&config.location(), signal, name)?;
    tracing::info!(
        legacy = outcome.legacy_loaded,
        live = ?outcome.live_path,
        subscribed = outcome.subscribed,
        "Preferences loaded"
    );
    Ok(facade)
}

fn read_key(facade: &PreferenceFacade, key: &str, kind: ValueKind) -> Result<String> {
    if !matches!(kind, ValueKind::List) && !facade.contains(key) {
        bail!("Key '{}' not found", key);
    }

    let rendered = match kind {
        ValueKind::Int => facade.get_opt::<i32>(key).map(|v| v.to_string()),
        ValueKind::Long => facade.get_opt::<i64>(key).map(|v| v.to_string()),
        ValueKind::Float => facade.get_opt::<f32>(key).map(|v| v.to_string()),
        ValueKind::Bool => facade.get_opt::<bool>(key).map(|v| v.to_string()),
        ValueKind::String => facade.get_opt::<String>(key).map(|s| format!("{:?}", s)),
        ValueKind::Set => facade
            .get_opt::<Vec<String>>(key)
            .map(|v| serde_json::to_string(&v))
            .transpose()?,
        ValueKind::List => {
            if !facade.layout().list_keys.iter().any(|k| k == key) {
                bail!("Key '{}' is not a configured list key", key);
            }
            facade
                .cached_list(key)
                .map(|v| serde_json::to_string(&v))
                .transpose()?
        }
    };

    rendered.with_context(|| format!("Key '{}' does not hold a value of the requested type", key))
}

fn print_all(facade: &PreferenceFacade) -> Result<()> {
    let entries = facade.get_all().unwrap_or_default();
    let sorted: std::collections::BTreeMap<_, _> = entries.iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);
    Ok(())
}

async fn watch(config: &Config, name: &str) -> Result<()> {
    if !config.watch.enabled {
        bail!("File watching is disabled in the config");
    }

    let module_dir = prefbridge::locate::module_data_dir(
        &config.location().host_data_dir()?,
        &config.layout.host_id,
        &config.layout.module_id,
    )?;
    let signal = FileWatchSignal::with_debounce(
        LiveStore::path_for(&module_dir, name),
        Duration::from_millis(config.watch.debounce_ms),
    );

    tracing::info!(path = %signal.path().display(), "Watching preferences file");
    let facade = load_facade(config, name, &signal)?;
    print_all(&facade)?;

    let mut seen = facade.reload_count();
    let mut ticker = tokio::time::interval(Duration::from_millis(config.watch.debounce_ms.max(50)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let current = facade.reload_count();
                if current != seen {
                    seen = current;
                    print_all(&facade)?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    facade.wait_for_cleanup();
    Ok(())
}
