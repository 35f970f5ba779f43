use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use launchspec::descriptor::{Ecosystem, LaunchDescriptor};
use launchspec::env::EnvSnapshot;
use launchspec::error::LoadError;
use launchspec::loader::Loader;
use launchspec::resolve::PathResolver;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::{Config, OutputFormat};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("launchspec")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("launchspec.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    let file = cli.command.file().unwrap_or(&config.default_file);
    info!("Loading ecosystem file: {}", file.display());

    if cli.is_verbose() {
        println!("{} {}", "Loading".yellow(), file.display());
    }

    let env = EnvSnapshot::capture();
    let resolver = PathResolver::from_env(&env).extend(config.extra_paths.iter().cloned());
    let loader = Loader::with_resolver(env, resolver);

    match &cli.command {
        Commands::Check { .. } => handle_check_command(&loader, file),
        Commands::Show { format, .. } => {
            handle_show_command(&loader, file, format.unwrap_or(config.output_format))
        }
        Commands::Plan { .. } => handle_plan_command(&loader, file),
    }
}

fn load_all(loader: &Loader<PathResolver>, file: &Path) -> Result<Vec<LaunchDescriptor>> {
    loader
        .load_ecosystem(file)
        .with_context(|| format!("Failed to load {}", file.display()))
}

fn handle_check_command(loader: &Loader<PathResolver>, file: &Path) -> Result<()> {
    let descriptors = match load_all(loader, file) {
        Ok(descriptors) => descriptors,
        Err(e) => {
            match e.downcast_ref::<LoadError>().and_then(LoadError::app) {
                Some(app) => println!("{} {} (app '{}')", "✗".red(), file.display(), app.bold()),
                None => println!("{} {}", "✗".red(), file.display()),
            }
            return Err(e);
        }
    };

    for descriptor in &descriptors {
        println!(
            "{} {} {} -> {} ({})",
            "✓".green(),
            descriptor.name().bold(),
            descriptor.command(),
            descriptor.executable().display(),
            descriptor.mode()
        );
    }
    println!("{} {} app(s) valid", "OK".green(), descriptors.len());
    Ok(())
}

fn handle_show_command(loader: &Loader<PathResolver>, file: &Path, format: OutputFormat) -> Result<()> {
    let apps = load_all(loader, file)?
        .iter()
        .map(LaunchDescriptor::to_registration)
        .collect();
    let ecosystem = Ecosystem::Apps { apps };

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&ecosystem).context("Failed to render JSON")?,
        OutputFormat::Yaml => serde_yaml::to_string(&ecosystem).context("Failed to render YAML")?,
    };
    println!("{}", rendered);
    Ok(())
}

fn handle_plan_command(loader: &Loader<PathResolver>, file: &Path) -> Result<()> {
    for descriptor in load_all(loader, file)? {
        let plan = descriptor.spawn_plan();
        println!(
            "{} {} x{} {} {}",
            plan.name.bold(),
            plan.mode.to_string().cyan(),
            plan.processes,
            plan.executable.display(),
            plan.argv.join(" ")
        );
        if descriptor.auto_restart() {
            let memory = descriptor
                .memory_threshold()
                .map(|m| format!(", memory ceiling {} bytes", m.bytes()))
                .unwrap_or_default();
            println!("  restart: on exit{}", memory);
        }
        if descriptor.watch_enabled() {
            println!("  watch: {}", descriptor.watch_root().display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
