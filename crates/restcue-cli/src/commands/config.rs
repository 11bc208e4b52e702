use std::path::PathBuf;

use clap::Subcommand;
use restcue_core::{Config, ConfigStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "pomodoro.work_minutes", "meals.timings")
        key: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value; lists are given as JSON, e.g. '["08:00","13:00"]'
        value: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List all config values as JSON
    List {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Overwrite the config with the sample document
    Reset {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the config file location
    Path,
}

fn resolve(config: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match config {
        Some(path) => Ok(path),
        None => Ok(Config::path()?),
    }
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key, config } => {
            let config = Config::load_from(&resolve(config)?);
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value, config } => {
            let mut store = ConfigStore::open(resolve(config)?);
            let mut updated = store.snapshot();
            updated.set(&key, &value)?;
            store.save(updated)?;
            println!("ok");
        }
        ConfigAction::List { config } => {
            let config = Config::load_from(&resolve(config)?);
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset { config } => {
            let path = resolve(config)?;
            Config::sample().save_to(&path)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
