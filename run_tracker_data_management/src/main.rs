use std::{fs::OpenOptions, path::{Path, PathBuf}, process::ExitCode};

use clap::{Parser, Subcommand};
use run_tracker_data_management::{
    config::TrackerConfig,
    gpx_util::read_gpx_fixes,
    heading::{acquire_heading, FixedHeading},
    recovery::{recover, DecisionProvider, FixedDecision, RecoveryDecision, RecoveryOutcome, StdinDecision},
    DataManagerError, SessionManager,
};
use run_tracker_lib::{export::export_file_name, track_point::Fix};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "run-tracker")]
#[command(about = "Record a run: GPS fixes, photos and crash recovery", long_about = None)]
struct Cli {
    /// Directory holding data/ (defaults to the project root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Restore an unfinished run without asking
    #[arg(long, global = true, conflicts_with = "discard")]
    resume: bool,
    /// Throw away an unfinished run without asking
    #[arg(long, global = true)]
    discard: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume tracking
    Start,
    /// Stop tracking, keeping the data
    Stop,
    /// Feed one GPS fix
    Fix {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
        /// Speed in m/s
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Attach a photo at the last known position
    Photo {
        file: PathBuf,
        /// Compass heading in degrees
        #[arg(long, allow_hyphen_values = true)]
        heading: Option<f64>,
    },
    /// Feed every point of a GPX file as a fix
    Replay { gpx: PathBuf },
    /// Print the current session
    Status,
    /// Write the session as JSON
    Export {
        /// Include photos
        #[arg(long)]
        photos: bool,
        /// Output directory (defaults to data/exports)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete the session and start over
    Reset {
        /// Export the full session before deleting it
        #[arg(long)]
        export: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TrackerConfig::load(cli.root.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(&config) {
        eprintln!("Failed to set up logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &TrackerConfig) -> Result<(), DataManagerError> {
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|err| DataManagerError::io(&log_dir, err))?;

    let log_file = log_dir.join("tracker.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|err| DataManagerError::io(&log_file, err))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,{}=trace,run_tracker_lib=trace", env!("CARGO_CRATE_NAME"), env!("CARGO_PKG_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    Ok(())
}

async fn run(cli: Cli, config: TrackerConfig) -> Result<(), DataManagerError> {
    let mut manager = SessionManager::open(&config)?;

    let decider: Box<dyn DecisionProvider> = if cli.resume {
        Box::new(FixedDecision(RecoveryDecision::Resume))
    } else if cli.discard {
        Box::new(FixedDecision(RecoveryDecision::Discard))
    } else {
        Box::new(StdinDecision)
    };
    let outcome = recover(&mut manager, &config.photo_database_path(), decider.as_ref()).await;
    tracing::debug!("Recovery finished: {:?}", outcome);
    if outcome == RecoveryOutcome::Undecided {
        return Err(DataManagerError::RecoveryUndecided);
    }

    match cli.command {
        Commands::Start => {
            manager.start();
            print_status(&manager);
        }
        Commands::Stop => {
            manager.stop();
            print_status(&manager);
        }
        Commands::Fix { lat, lng, speed } => {
            manager.start();
            let point = manager.append_track_point(Fix::new(lat, lng, speed, manager.now_ms()))?;
            println!("{:.6}, {:.6} at {}s, total {:.1} m", point.latitude, point.longitude, point.elapsed_seconds, manager.state().total_distance_meters);
        }
        Commands::Photo { file, heading } => {
            manager.start();
            let image = std::fs::read(&file).map_err(|err| DataManagerError::io(&file, err))?;
            let heading = match heading {
                Some(degrees) => acquire_heading(&FixedHeading(degrees), config.heading_timeout).await,
                None => 0,
            };

            let photo = manager.append_photo(&image, heading).await?;
            println!("Photo at {:.6}, {:.6}, heading {}", photo.latitude, photo.longitude, photo.heading_degrees);
        }
        Commands::Replay { gpx } => {
            manager.start();
            let now = chrono::DateTime::from_timestamp_millis(manager.now_ms()).unwrap_or_default();
            for fix in read_gpx_fixes(&gpx, now)? {
                manager.append_track_point(fix)?;
            }
            print_status(&manager);
        }
        Commands::Status => print_status(&manager),
        Commands::Export { photos, out } => {
            let dir = out.unwrap_or_else(|| config.export_dir());
            let path = write_export(&manager, &dir, photos)?;
            println!("Exported to {}", path.display());
        }
        Commands::Reset { export } => {
            if export {
                let path = write_export(&manager, &config.export_dir(), true)?;
                println!("Exported to {}", path.display());
            }
            manager.reset().await;
            println!("Session reset");
        }
    }

    Ok(())
}

fn write_export(manager: &SessionManager, dir: &Path, include_photos: bool) -> Result<PathBuf, DataManagerError> {
    let document = manager.export(include_photos);
    let now = chrono::DateTime::from_timestamp_millis(manager.now_ms()).unwrap_or_default();

    std::fs::create_dir_all(dir).map_err(|err| DataManagerError::io(dir, err))?;
    let path = dir.join(export_file_name(now, include_photos));
    std::fs::write(&path, document.to_json()?).map_err(|err| DataManagerError::io(&path, err))?;

    tracing::info!("Wrote export {}", path.display());
    Ok(path)
}

fn print_status(manager: &SessionManager) {
    let state = manager.state();
    println!("{}\t{}\t{:.2} km\t{} points\t{} photos",
        if state.is_tracking { "TRACKING" } else { "STOPPED" },
        manager.duration_label(),
        state.total_distance_meters / 1000.,
        state.track_points.len(),
        state.photos.len(),
    );
}
