use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Args;
use restcue_core::{
    Config, ConfigStore, FixedSleepPacer, ReminderScheduler, SchedulerContext, SystemClock,
};
use tracing::info;

use crate::console::{spawn_input_reader, ConsoleGateway, OpenPrompts};

#[derive(Args)]
pub struct RunArgs {
    /// Config file (defaults to ~/.config/restcue/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the *_icon.png assets
    #[arg(long, default_value = "assets")]
    assets: PathBuf,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = match args.config {
        Some(path) => path,
        None => Config::path()?,
    };

    let prompts = Arc::new(Mutex::new(OpenPrompts::default()));
    let gateway = ConsoleGateway::new(args.assets, Arc::clone(&prompts));
    let ctx = SchedulerContext::new(ConfigStore::open(&path), Box::new(SystemClock));
    let mut scheduler = ReminderScheduler::new(ctx, gateway);

    let shutdown = scheduler.shutdown_handle();
    ctrlc::set_handler(move || shutdown.request())?;
    spawn_input_reader(scheduler.command_sender(), prompts);

    info!(config = %path.display(), "restcue running, type `quit` to stop");
    scheduler.run(&mut FixedSleepPacer::default());
    Ok(())
}
