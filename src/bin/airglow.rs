//! airglow CLI
//!
//! Commands:
//! - run: Poll PurpleAir, update the LIFX bulb and write the status file
//! - color: Print the bulb color for a PM2.5 value
//! - doctor: Diagnose configuration, credentials and the status path

use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use airglow::color::{color_for_str, COLOR_BANDS, NO_DATA_COLOR};
use airglow::config::{AirglowConfig, Credentials, LIFX_KEY_VAR, PURPLEAIR_KEY_VAR};
use airglow::pipeline::{AirglowProcessor, RunOptions};
use airglow::{AirglowError, AIRGLOW_VERSION, PRODUCER_NAME};

/// airglow - PurpleAir PM2.5 to LIFX bulb color
#[derive(Parser)]
#[command(name = "airglow")]
#[command(version = AIRGLOW_VERSION)]
#[command(about = "Set a LIFX bulb color from PurpleAir PM2.5 readings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll sensors, update the bulb and write the status file
    Run {
        /// Config file (defaults to ./airglow.toml or ./config/airglow.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Set this literal color and exit, skipping all sensor logic
        #[arg(long, env = "AIRGLOW_COLOR")]
        color: Option<String>,

        /// Sensor index to poll (repeatable; replaces the configured list)
        #[arg(long = "sensor")]
        sensors: Vec<i64>,

        /// LIFX device id
        #[arg(long)]
        device_id: Option<String>,

        /// Where to write the status JSON
        #[arg(long)]
        status_path: Option<PathBuf>,

        /// Readings older than this are ignored
        #[arg(long)]
        max_age_minutes: Option<u32>,

        /// Compute the decision without changing the bulb or writing status
        #[arg(long)]
        dry_run: bool,

        /// Print the status snapshot to stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the color for a PM2.5 value
    Color {
        /// Corrected PM2.5 (µg/m³)
        #[arg(allow_hyphen_values = true)]
        pm25: String,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AirglowError> {
    match cli.command {
        Commands::Run {
            config,
            color,
            sensors,
            device_id,
            status_path,
            max_age_minutes,
            dry_run,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if !sensors.is_empty() {
                config.purpleair.sensors = sensors;
            }
            if let Some(device_id) = device_id {
                config.lifx.device_id = device_id;
            }
            if let Some(path) = status_path {
                config.status.path = path;
            }
            if let Some(minutes) = max_age_minutes {
                config.purpleair.max_age_minutes = minutes;
            }
            let color = color.filter(|c| !c.trim().is_empty());
            cmd_run(config, color.as_deref(), dry_run, json)
        }

        Commands::Color { pm25 } => {
            println!("{}", color_for_str(&pm25));
            Ok(())
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

/// Start logging before anything can fail. Without RUST_LOG the level starts
/// at info and is lowered or raised once the config is known.
fn init_logging() {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env().init();
    } else {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Trace)
            .init();
        log::set_max_level(LevelFilter::Info);
    }
}

/// Load the explicit or located config and apply its log level (RUST_LOG wins)
fn load_config(explicit: Option<&Path>) -> Result<AirglowConfig, AirglowError> {
    let config = match explicit.map(Path::to_path_buf).or_else(AirglowConfig::locate) {
        Some(path) => {
            let config = AirglowConfig::load(&path)?;
            info!("Loaded config from {}", path.display());
            config
        }
        None => {
            info!("No config file found, using defaults");
            AirglowConfig::default()
        }
    };

    if std::env::var_os("RUST_LOG").is_none() {
        match config.logging.level.parse::<LevelFilter>() {
            Ok(level) => log::set_max_level(level),
            Err(_) => warn!(
                "Unknown logging.level {:?}, keeping info",
                config.logging.level
            ),
        }
    }
    Ok(config)
}

fn cmd_run(
    config: AirglowConfig,
    color: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<(), AirglowError> {
    let credentials = Credentials::from_env()?;
    let processor = AirglowProcessor::new(config, &credentials)?;

    if let Some(color) = color {
        processor.set_color(color)?;
        return Ok(());
    }

    let report = processor.run(RunOptions { dry_run })?;

    if json {
        println!("{}", report.snapshot.to_json()?);
    }
    Ok(())
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), AirglowError> {
    let mut checks = Vec::new();

    let config = match config_path.map(Path::to_path_buf).or_else(AirglowConfig::locate) {
        Some(path) => match AirglowConfig::load(&path) {
            Ok(config) => {
                checks.push(DoctorCheck::ok("config", format!("Loaded {}", path.display())));
                config
            }
            Err(e) => {
                checks.push(DoctorCheck::error("config", e.to_string()));
                AirglowConfig::default()
            }
        },
        None => {
            checks.push(DoctorCheck::warning(
                "config",
                "No config file found, using defaults".to_string(),
            ));
            AirglowConfig::default()
        }
    };

    for var in [PURPLEAIR_KEY_VAR, LIFX_KEY_VAR] {
        let present = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        checks.push(if present {
            DoctorCheck::ok(var, "Set".to_string())
        } else {
            DoctorCheck::error(var, "Not set".to_string())
        });
    }
    checks.push(if config.purpleair.sensors.is_empty() {
        DoctorCheck::warning("sensors", "No sensors configured".to_string())
    } else {
        DoctorCheck::ok("sensors", format!("{:?}", config.purpleair.sensors))
    });

    checks.push(check_status_path(&config.status.path));

    checks.push(DoctorCheck::ok(
        "color_bands",
        format!("{} bands, no-data {}", COLOR_BANDS.len(), NO_DATA_COLOR),
    ));

    let failed = checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: AIRGLOW_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("airglow Doctor Report");
        println!("=====================");
        println!("Version: {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERROR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if failed {
        Err(AirglowError::Config(
            "one or more health checks failed".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn check_status_path(path: &Path) -> DoctorCheck {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let marker = dir.join(".airglow-doctor");
    let result = fs::create_dir_all(dir)
        .and_then(|_| fs::write(&marker, b"ok"))
        .and_then(|_| fs::remove_file(&marker));

    match result {
        Ok(()) => DoctorCheck::ok("status_path", format!("{} is writable", path.display())),
        Err(e) => DoctorCheck::warning(
            "status_path",
            format!("{} is not writable: {}", dir.display(), e),
        ),
    }
}

// Error types

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
    /// Failure came from PurpleAir or LIFX rather than local setup
    upstream: bool,
}

impl From<AirglowError> for CliError {
    fn from(e: AirglowError) -> Self {
        let (code, hint) = match &e {
            AirglowError::MissingCredential(_) => (
                "MISSING_CREDENTIAL",
                Some("Export PURPLEAIR_API_KEY and LIFX_API_KEY"),
            ),
            AirglowError::Config(_) | AirglowError::Toml(_) => {
                ("CONFIG_ERROR", Some("Run 'airglow doctor' for details"))
            }
            AirglowError::Http(_) => ("HTTP_ERROR", Some("Check network connectivity")),
            AirglowError::SensorApi { .. } => (
                "SENSOR_API_ERROR",
                Some("Check the PurpleAir API key and sensor indices"),
            ),
            AirglowError::BulbApi { .. } => (
                "BULB_API_ERROR",
                Some("Check the LIFX token and device id"),
            ),
            AirglowError::Metadata(_) => ("METADATA_ERROR", None),
            AirglowError::Json(_) => ("JSON_ERROR", None),
            AirglowError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
        };
        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: hint.map(str::to_string),
            upstream: e.is_upstream(),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message,
        }
    }

    fn warning(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message,
        }
    }

    fn error(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message,
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_marks_upstream_failures() {
        let err = CliError::from(AirglowError::SensorApi {
            status: 403,
            body: "forbidden".to_string(),
        });
        assert_eq!(err.code, "SENSOR_API_ERROR");
        assert!(err.upstream);

        let err = CliError::from(AirglowError::MissingCredential(LIFX_KEY_VAR));
        assert_eq!(err.code, "MISSING_CREDENTIAL");
        assert!(!err.upstream);

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["upstream"], false);
    }

    #[test]
    fn test_malformed_config_is_fatal() {
        let dir = std::env::temp_dir().join(format!("airglow-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("airglow.toml");
        fs::write(&path, "[purpleair]\nsensors = \"abc\"\n").unwrap();

        let result = load_config(Some(&path));
        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(result, Err(AirglowError::Toml(_))));
    }
}
