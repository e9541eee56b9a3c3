pub(crate) mod color;
pub(crate) mod compositor;
pub(crate) mod config;
pub(crate) mod driver;
pub(crate) mod effects;
pub(crate) mod intervaltimer;
pub(crate) mod scheduler;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config_file::FromConfigFile;

use crate::config::Config;
use crate::driver::OlaDriver;
use crate::scheduler::Scheduler;

#[derive(Parser)]
struct Cli {
    /// The TOML configuration file to load instead of the built-in defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The OLA OSC endpoint to send frames to
    #[arg(short, long, value_name = "ADDR")]
    target: Option<SocketAddr>,
}

fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = match args.config.as_deref() {
        Some(path) => Config::from_config_file(path)
            .with_context(|| format!("cannot read configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(target) = args.target {
        config.ola_address = target.to_string();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let config = load_config(&args)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log::info!("stop requested");
        handler_stop.store(true, Ordering::Relaxed);
    })
    .context("cannot install the Ctrl-C handler")?;

    let driver = OlaDriver::new(config.target_addr()?);
    let mut scheduler = Scheduler::new(config, driver, rand::thread_rng());
    scheduler.run(&stop)?;

    log::info!("stopped");
    Ok(())
}
