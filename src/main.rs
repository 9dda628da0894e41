//! Binary entrypoint for the rflogger CLI.
//!
//! Commands:
//! - `log [--port <path>] [-b <baud>] [--output-log <csv>] [--run-seconds <s>]` - record sweeps
//! - `probe [--port <path>] [-b <baud>] [--timeout <s>]` - query identity and configuration
//! - `command <name> [--port <path>] [-b <baud>]` - send a single device command
//! - `init` - create a starter `rflogger.toml`
//!
//! See the library crate docs for module-level details: `rfexplorer_logger::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
#[allow(unused_imports)]
use log::{info, warn};

use rfexplorer_logger::config::Config;

#[derive(Parser)]
#[command(name = "rflogger")]
#[command(about = "Record RF Explorer spectrum sweeps to CSV")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "rflogger.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Record sweeps to a CSV table
    Log {
        /// Analyzer serial port (e.g., /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,
        /// Baud rate
        #[arg(short = 'b', long)]
        baud: Option<u32>,
        /// CSV file to write
        #[arg(short, long)]
        output_log: Option<String>,
        /// Stop this many seconds after the first sweep
        #[arg(short, long)]
        run_seconds: Option<f64>,
    },
    /// Query serial number and configuration, print a JSON summary
    Probe {
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short = 'b', long)]
        baud: Option<u32>,
        /// Seconds to wait before giving up
        #[arg(short, long, default_value_t = 5)]
        timeout: u64,
    },
    /// Send one command: config, shutdown, hold, reboot, lcd-on, lcd-off, dump-on, dump-off, serial, baud=<rate>
    Command {
        name: String,
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short = 'b', long)]
        baud: Option<u32>,
    },
    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    // A missing config file is fine; defaults apply and flags override them.
    let mut config = match Config::load(&cli.config).await {
        Ok(c) => Some(c),
        Err(e) if std::path::Path::new(&cli.config).exists() => return Err(e),
        Err(_) => None,
    };
    init_logging(&config, cli.verbose);
    let config_ref = config.get_or_insert_with(Config::default);

    match cli.command {
        Commands::Log {
            port,
            baud,
            output_log,
            run_seconds,
        } => {
            apply_overrides(config_ref, port, baud)?;
            if output_log.is_some() {
                config_ref.capture.output_log = output_log;
            }
            if run_seconds.is_some() {
                config_ref.capture.run_seconds = run_seconds;
            }
            config_ref.validate()?;
            run_log(config_ref).await?;
        }
        Commands::Probe {
            port,
            baud,
            timeout,
        } => {
            apply_overrides(config_ref, port, baud)?;
            let ok = run_probe(config_ref, timeout).await?;
            std::process::exit(if ok { 0 } else { 1 });
        }
        Commands::Command { name, port, baud } => {
            apply_overrides(config_ref, port, baud)?;
            let command: rfexplorer_logger::rfexplorer::Command = name.parse()?;
            run_command(config_ref, command)?;
        }
        Commands::Init => unreachable!("handled before config load"),
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, port: Option<String>, baud: Option<u32>) -> Result<()> {
    if let Some(p) = port {
        config.device.port = p;
    }
    if let Some(b) = baud {
        config.device.baud_rate = b;
    }
    config.validate()
}

#[cfg(not(feature = "serial"))]
async fn run_log(_config: &Config) -> Result<()> {
    Err(anyhow!("log requires the 'serial' feature"))
}

#[cfg(not(feature = "serial"))]
async fn run_probe(_config: &Config, _timeout: u64) -> Result<bool> {
    Err(anyhow!("probe requires the 'serial' feature"))
}

#[cfg(not(feature = "serial"))]
fn run_command(_config: &Config, _command: rfexplorer_logger::rfexplorer::Command) -> Result<()> {
    Err(anyhow!("command requires the 'serial' feature"))
}

#[cfg(feature = "serial")]
async fn run_log(config: &Config) -> Result<()> {
    use chrono::{Duration as ChronoDuration, Local};
    use rfexplorer_logger::rfexplorer::{RfExplorer, TransportError};
    use rfexplorer_logger::sweeplog::SweepLog;
    use tokio::time::{sleep, Duration};

    let path = config
        .capture
        .output_log
        .clone()
        .ok_or_else(|| anyhow!("no output log given (--output-log or capture.output_log)"))?;
    println!("=== Opening \"{}\" ...", path);
    let file = std::fs::File::create(&path)
        .map_err(|e| anyhow!("Failed to create output log {}: {}", path, e))?;
    let mut table = SweepLog::new(std::io::BufWriter::new(file));

    println!("=== Connecting to \"{}\" ...", config.device.port);
    let mut explorer = RfExplorer::open(&config.device.port, config.device.baud_rate)?;
    explorer.send_request_config()?;

    let poll_interval = Duration::from_millis(config.capture.poll_interval_ms);
    let status_interval = ChronoDuration::seconds(config.capture.status_interval_secs as i64);
    let mut next_status = Local::now();
    let mut finish_time = None;
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());

    println!("=== Receiving data...");
    loop {
        let now = Local::now();
        let stamp = now.format("%m-%d %H:%M:%S");
        if now > next_status {
            next_status = now + status_interval;
            table.flush()?;
            match &explorer.state().configuration {
                None => println!("{} - starting...", stamp),
                Some(cc) => println!(
                    "{} - {:4}x ({:.3}MHz - {:.3}MHz / {} points)",
                    stamp,
                    table.rows(),
                    1e-6 * cc.start_freq as f64,
                    1e-6 * cc.stop_freq() as f64,
                    cc.sweep_points
                ),
            }
        }

        if let Some(finish) = finish_time {
            if now > finish {
                println!("{} - finished run", stamp);
                break;
            }
        }

        // Every iteration races the interrupt, including polls that keep yielding data.
        let polled = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Interrupted, closing {}", path);
                break;
            }
            polled = async {
                let updates = explorer.poll()?;
                if updates.is_empty() {
                    sleep(poll_interval).await;
                }
                Ok::<_, TransportError>(updates)
            } => polled,
        };
        polled?;

        for sweep in explorer.drain_sweeps() {
            table.write_sweep(&sweep)?;
        }
        if finish_time.is_none() {
            if let (Some(secs), Some(first)) = (config.capture.run_seconds, table.first_timestamp()) {
                let finish = first + ChronoDuration::milliseconds((secs * 1000.0) as i64);
                println!(
                    "{} - run to {} ({:+.1}s)",
                    first.format("%m-%d %H:%M:%S"),
                    finish.format("%H:%M:%S"),
                    secs
                );
                finish_time = Some(finish);
            }
        }
    }

    table.flush()?;
    let counters = explorer.counters();
    let discard_ratio = counters
        .sweep_discard_ratio()
        .map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    info!(
        "Logged {} sweeps ({} discarded, {} of received; {} garbage bytes skipped)",
        table.rows(),
        counters.sweeps_discarded,
        discard_ratio,
        counters.garbage_bytes
    );
    Ok(())
}

#[cfg(feature = "serial")]
async fn run_probe(config: &Config, timeout: u64) -> Result<bool> {
    use rfexplorer_logger::rfexplorer::RfExplorer;
    use tokio::time::{sleep, Duration, Instant};

    let mut explorer = RfExplorer::open(&config.device.port, config.device.baud_rate)?;
    info!(
        "Probing {} @ {} baud",
        config.device.port, config.device.baud_rate
    );
    explorer.send_request_serial_number()?;
    explorer.send_request_config()?;
    let deadline = Instant::now() + Duration::from_secs(timeout);
    while Instant::now() < deadline {
        if explorer.poll()?.is_empty() {
            sleep(Duration::from_millis(config.capture.poll_interval_ms)).await;
        }
        let st = explorer.state();
        if st.serial_number.is_some() && st.configuration.is_some() && st.setup.is_some() {
            break;
        }
    }
    let st = explorer.state();
    let ok = st.serial_number.is_some() && st.configuration.is_some();
    if !ok {
        warn!("No identity/configuration received from {}", config.device.port);
    }
    let counters = explorer.counters();
    let payload = serde_json::json!({
        "status": if ok { "ok" } else { "incomplete" },
        "serial_number": st.serial_number,
        "setup": st.setup,
        "configuration": st.configuration,
        "tracking_status": st.tracking_status,
        "frames_decoded": counters.frames_decoded,
        "garbage_bytes": counters.garbage_bytes,
        "timeout_seconds": timeout,
    });
    println!("{}", payload);
    Ok(ok)
}

#[cfg(feature = "serial")]
fn run_command(config: &Config, command: rfexplorer_logger::rfexplorer::Command) -> Result<()> {
    use rfexplorer_logger::rfexplorer::RfExplorer;

    let mut explorer = RfExplorer::open(&config.device.port, config.device.baud_rate)?;
    explorer.send(command)?;
    info!("Sent {} to {}", command, config.device.port);
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });
    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
