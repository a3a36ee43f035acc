use anyhow::{bail, Context, Result};
use clap::Parser;
use motorlog::args::{Cli, Commands, ConfigAction};
use motorlog::config::{self, Settings};
use motorlog::{analysis, report, table};
use std::process;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let file = config::load_config_file(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli.overrides(), file.as_ref())?;

    if let Some(command) = cli.command {
        match command {
            Commands::Config { action } => match action {
                ConfigAction::Show => print!("{}", settings.to_kdl()),
                ConfigAction::Init { force } => {
                    let path = config::default_config_path()?;
                    if path.exists() && !force {
                        bail!("{} already exists (use --force to overwrite)", path.display());
                    }
                    if let Some(dir) = path.parent() {
                        std::fs::create_dir_all(dir)
                            .with_context(|| format!("Failed to create {}", dir.display()))?;
                    }
                    std::fs::write(&path, Settings::default().to_kdl())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote default configuration to {}", path.display());
                }
            },
        }
        return Ok(());
    }

    let samples = table::load_table(&settings.input, &settings.table)
        .with_context(|| format!("Failed to load table from {}", settings.input.display()))?;

    let channels = settings
        .channels
        .clone()
        .unwrap_or_else(|| analysis::available_channels(&samples));

    let reports = analysis::analyze(&samples, channels, &settings.segment)
        .context("Failed to segment motor currents")?;

    let rendered = report::render(&reports, settings.format)?;
    report::write_report(&settings.output, &rendered)?;

    println!("Data has been saved in {}.", settings.output.display());
    Ok(())
}
