//! `motionlog` - CLI for the motion-sensor telemetry logger
//!
//! This binary runs the sampling pipeline against the simulated sensor and
//! provides access to the stored log and the configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use motionlog::cli::{Cli, Command, ConfigCommand, DumpCommand, OutputFormat, RunCommand};
use motionlog::escalation::audit_entries;
use motionlog::sensor::SimulatedSensor;
use motionlog::{init_logging, Config, FileStorage, HaltReport, Pipeline};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Run(run_cmd) => handle_run(config, run_cmd),
        Command::Dump(dump_cmd) => handle_dump(&config, &dump_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn runtime(worker_threads: usize) -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name("motionlog-worker")
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn handle_run(mut config: Config, cmd: RunCommand) -> anyhow::Result<()> {
    if let Some(log) = cmd.log {
        config.storage.log_path = Some(log);
    }
    if let Some(cycle) = cmd.fault_at {
        config.sensor.fault_at_cycle = Some(cycle);
    }
    if let Some(period_ms) = cmd.period_ms {
        config.pipeline.sample_period_ms = period_ms;
    }
    config.validate()?;

    let storage = Arc::new(FileStorage::new(config.log_path()));
    let sensor = SimulatedSensor::new(config.simulated_sensor());
    let pipeline = Pipeline::from_config(&config, sensor, storage);

    let report = runtime(config.pipeline.worker_threads)?.block_on(pipeline.run())?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_halt_report(&report, &config.log_path()),
    }

    bail!(
        "system halted after invalid reading on cycle {}: {}",
        report.fault.cycle,
        report.fault.reading
    )
}

fn print_halt_report(report: &HaltReport, log_path: &std::path::Path) {
    println!("motionlog halt report");
    println!("---------------------");
    println!("Log:           {}", log_path.display());
    println!("Fault cycle:   {}", report.fault.cycle);
    println!("Reading:       {}", report.fault.reading);
    println!("Sampled:       {}", report.fault.stats.sampled);
    println!("Sent:          {}", report.fault.stats.sent);
    if let Some(persister) = report.persister {
        println!("Persisted:     {}", persister.persisted);
        println!("Dropped:       {}", persister.dropped);
    }
    match report.initial_pose() {
        Some(pose) => println!("Initial pose:  {pose}"),
        None => println!("Initial pose:  (none latched)"),
    }
    println!("Detected at:   {}", report.detected_at.to_rfc3339());
    println!("Halted at:     {}", report.halted_at.to_rfc3339());
    println!();

    if let Some(err) = &report.audit_error {
        println!("Audit dump unavailable: {err}");
    } else if report.audit.is_empty() {
        println!("Audit dump: no records stored.");
    } else {
        println!("Audit dump ({} entries):", report.audit.len());
        for entry in &report.audit {
            println!("  {entry}");
        }
    }
}

fn handle_dump(config: &Config, cmd: &DumpCommand) -> anyhow::Result<()> {
    let path: PathBuf = cmd.log.clone().unwrap_or_else(|| config.log_path());
    if !path.exists() {
        println!("No log at {}", path.display());
        return Ok(());
    }

    let storage = FileStorage::new(&path);
    let (entries, stats) = runtime(1)?.block_on(async {
        let entries = audit_entries(&storage).await?;
        let stats = storage.stats().await?;
        Ok::<_, motionlog::Error>((entries, stats))
    })?;

    match cmd.format {
        OutputFormat::Json => {
            let dump = serde_json::json!({
                "log_path": path,
                "stats": stats,
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{entry}");
            }
            println!();
            println!(
                "{} records, {} bytes in {}",
                stats.records,
                stats.size_bytes,
                path.display()
            );
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Log path:           {}", config.log_path().display());
                println!();
                println!("[Pipeline]");
                println!("  Sample period (ms): {}", config.pipeline.sample_period_ms);
                println!("  Channel capacity:   {}", config.pipeline.channel_capacity);
                println!("  Worker threads:     {}", config.pipeline.worker_threads);
                println!();
                println!("[Escalation]");
                println!(
                    "  Recovery wait (ms): {}",
                    config.escalation.recovery_wait_ms
                );
                println!();
                println!("[Sensor]");
                println!("  Seed:               {}", config.sensor.seed);
                println!("  Noise:              {}", config.sensor.noise);
                match config.sensor.fault_at_cycle {
                    Some(cycle) => println!("  Fault at cycle:     {cycle}"),
                    None => println!("  Fault at cycle:     never"),
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
