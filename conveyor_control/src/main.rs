//! # Conveyor Control
//!
//! Runs the scan loop against the built-in conveyor model with a scripted
//! operator. Loads one TOML file (`[shared]`, `[engine]`, `[parameters]`,
//! `[simulation]`), performs RT setup, and scans until the configured
//! duration elapses or Ctrl-C arrives.

use clap::Parser;
use conveyor_common::config::ConfigError;
use conveyor_common::consts::DEFAULT_CONFIG_PATH;
use conveyor_control::config::{ControlConfig, load_config};
use conveyor_control::cycle::{CycleRunner, Pacing, rt_setup};
use conveyor_control::sim::{ConveyorSim, OperatorScript};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Conveyor Control: fixed-cycle line control loop
#[derive(Parser, Debug)]
#[command(name = "conveyor_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-cycle control loop for a conveyor line with diverter")]
struct Args {
    /// Path to the configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run length in seconds of engine time (overrides simulation.duration_sec).
    #[arg(long)]
    duration: Option<f64>,

    /// Scan back-to-back without wall-clock pacing.
    #[arg(long)]
    fast: bool,

    /// CPU core to pin the scan thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Print the final status view as JSON on stdout.
    #[arg(long)]
    status_json: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_config(&args.config);

    let level = match (&config, args.verbose) {
        (_, true) => Level::DEBUG,
        (Ok(c), false) => c.shared.log_level.into(),
        (Err(_), false) => Level::INFO,
    };
    setup_tracing(level, args.json);

    info!("Conveyor Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|c| run(&args, c));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Conveyor Control shutdown complete");
}

fn run(args: &Args, config: ControlConfig) -> Result<(), Box<dyn std::error::Error>> {
    let scan_period = config.engine.scan_period();
    let duration_sec = args.duration.unwrap_or(config.simulation.duration_sec);
    if !(duration_sec > 0.0 && duration_sec.is_finite()) {
        return Err(Box::new(ConfigError::ValidationError(format!(
            "duration must be > 0, got {duration_sec}"
        ))));
    }
    let max_cycles = (duration_sec / scan_period.as_secs_f64()).ceil() as u64;

    info!(
        "Config OK: service={} scan={}us jam_timeout={:.1}s speed={:.2} cycles={}",
        config.shared.service_name,
        config.engine.scan_period_us,
        config.parameters.jam_timeout_sec(),
        config.parameters.conveyor_speed(),
        max_cycles
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let sim = ConveyorSim::new(config.simulation.clone(), scan_period);
    let mut script = OperatorScript::new(&config.simulation, scan_period);
    let mut runner = CycleRunner::new(&config.engine, config.parameters, sim);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })?;

    let pacing = if args.fast {
        Pacing::Fast
    } else {
        Pacing::RealTime
    };
    runner.run(Some(max_cycles), pacing, &shutdown, |panel, status| {
        script.on_boundary(panel, status)
    })?;

    let status = runner.engine().status();
    let m = status.metrics;
    let counters = runner.io().counters();
    info!(
        "Final state {} ({}): boxes={} jams={} avg_cycle={:.2}s throughput={:.1}/h uptime={:.1}%",
        status.state,
        status.fault_code,
        m.box_count,
        m.jam_count,
        m.avg_cycle_time_sec,
        m.throughput_per_hour,
        m.uptime_percent
    );
    info!(
        "Process: arrived={} accepted={} rejected={} jams_injected={}",
        counters.arrived, counters.accepted, counters.rejected, counters.jams_injected
    );
    for record in runner.engine().journal() {
        info!(
            "  cycle {:>7}: {} -> {} ({})",
            record.cycle, record.from, record.to, record.reason
        );
    }

    if args.status_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    }

    Ok(())
}

/// Setup tracing subscriber.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
