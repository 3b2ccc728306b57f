use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fire_gama::export::{ExportConfig, Exporter, InputSource, OutputTarget};
use fire_gama::info::{infotype_report, point_report, srid_report};
use fire_gama::ReferenceStore;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fire", author, version, about = "Command line interface to the FIRE fixed point registry", long_about = None)]
struct Cli {
    /// JSON snapshot of the reference registry
    #[arg(long, env = "FIRE_DATABASE", value_name = "PATH", global = true)]
    database: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Work with levelling field files
    #[command(subcommand)]
    Mark(MarkCommand),

    /// Information about registry objects
    #[command(subcommand)]
    Info(InfoCommand),
}

#[derive(Subcommand, Debug)]
enum MarkCommand {
    /// Convert field files to GNU Gama input.
    ///
    /// Output goes to a file named like the first input file but with
    /// extension '.xml', unless '-o' says otherwise.
    Gamaficer(GamaficerArgs),
}

#[derive(Args, Debug)]
struct GamaficerArgs {
    /// Field files, e.g. 'KDI2018vest.txt'; '-' reads standard input
    #[arg(value_name = "FILNAVNE")]
    inputs: Vec<String>,

    /// Output file name; '-' writes to standard output
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Directory for the GeoJSON overview files
    #[arg(long, value_name = "DIR", default_value = ".")]
    geojson_dir: PathBuf,

    /// Height reference system of the elevations
    #[arg(long, value_name = "CODE", default_value = fire_gama::export::DEFAULT_ELEVATION_SRID)]
    srid: String,

    /// Identifier prefix of fixed points
    #[arg(long, value_name = "PREFIX", default_value = fire_gama::model::DEFAULT_FIXED_PREFIX)]
    fixed_prefix: String,

    /// Text of the description block
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand, Debug)]
enum InfoCommand {
    /// Show everything known about a fixed point
    Punkt { ident: String },
    /// Show a spatial reference id, e.g. EPSG:25832 or DK:SYS34
    Srid { srid: String },
    /// Show a point information type, e.g. IDENT:GNSS
    Infotype { infotype: String },
}

fn main() {
    // Parse arguments and set up logging
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = if cli.verbose || cli.quiet {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    // stdout may carry the XML document
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let database = cli
        .database
        .context("No reference snapshot given, use --database or FIRE_DATABASE")?;
    let store = ReferenceStore::open(&database)?;

    match cli.command {
        Command::Mark(MarkCommand::Gamaficer(args)) => gamaficer(&store, args),
        Command::Info(command) => {
            let mut out = io::stdout().lock();
            match command {
                InfoCommand::Punkt { ident } => point_report(&store, &ident, &mut out)?,
                InfoCommand::Srid { srid } => srid_report(&store, &srid, &mut out)?,
                InfoCommand::Infotype { infotype } => infotype_report(&store, &infotype, &mut out)?,
            }
            Ok(())
        }
    }
}

fn gamaficer(store: &ReferenceStore, args: GamaficerArgs) -> Result<()> {
    // Record the start time
    let start_time = std::time::Instant::now();

    // No file names means standard input
    let mut names = args.inputs;
    if names.is_empty() {
        names.push(OutputTarget::STDIO_SENTINEL.to_string());
    }

    // Output name follows the first input unless given
    let output = match &args.output {
        Some(path) => OutputTarget::from_arg(path),
        None => OutputTarget::default_for(&names[0]),
    };

    // Open the inputs
    let mut inputs = Vec::with_capacity(names.len());
    for name in names {
        if name == OutputTarget::STDIO_SENTINEL {
            inputs.push(InputSource::new("<stdin>", BufReader::new(io::stdin())));
        } else {
            let file = File::open(&name).with_context(|| format!("Failed to open {name}"))?;
            inputs.push(InputSource::new(name, BufReader::new(file)));
        }
    }

    let mut config = ExportConfig {
        elevation_srid_code: args.srid,
        fixed_prefix: args.fixed_prefix,
        points_path: args.geojson_dir.join("punkter.geojson"),
        observations_path: args.geojson_dir.join("observationer.geojson"),
        ..ExportConfig::default()
    };
    if let Some(description) = args.description {
        config.description = description;
    }

    let summary = Exporter::new(store, config).run(inputs, &output)?;
    info!(
        "Exported {} points ({} fixed) and {} observations",
        summary.points, summary.fixed_points, summary.observations
    );
    let output_name = match &summary.output {
        OutputTarget::Stdout => "<stdout>".to_string(),
        OutputTarget::File(path) => path.display().to_string(),
    };
    info!(
        "Outputs: {}, {}, {}",
        summary.points_path.display(),
        summary.observations_path.display(),
        output_name
    );
    if summary.sentinel_endpoints > 0 {
        tracing::warn!(
            "{} observation endpoints were not registered points",
            summary.sentinel_endpoints
        );
    }
    // Report the elapsed time
    info!("Total processing time: {:?}", start_time.elapsed());

    Ok(())
}
