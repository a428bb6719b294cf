use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use scan_convert::app::App;
use scan_convert::config::ConfigLoader;
use scan_convert::error::{ConvertError, ErrorStatus};
use scan_convert::fs_util::write_atomic;
use scan_convert::output::{JsonOutput, LogSink};
use scan_convert::store::OutputStore;

#[derive(Parser)]
#[command(name = "scan-convert")]
#[command(about = "Decompose HDF5 containers and DICOM/NIfTI archives into browsable output trees")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    output_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Convert an uploaded .h5/.hdf5/.zip/.dcm/.dicom/.nii/.nii.gz file")]
    Convert(ConvertArgs),
    #[command(about = "List the children of a folder in the output tree")]
    Ls(LsArgs),
    #[command(about = "List the images of an output folder")]
    Images(FolderArgs),
    #[command(about = "Print or save one file from the output tree")]
    Cat(CatArgs),
    #[command(about = "Zip a folder of the output tree")]
    Bundle(BundleArgs),
}

#[derive(Args)]
struct ConvertArgs {
    file: PathBuf,

    /// Declared upload name; defaults to the file name.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct LsArgs {
    #[arg(default_value = "")]
    path: String,
}

#[derive(Args)]
struct FolderArgs {
    folder: String,
}

#[derive(Args)]
struct CatArgs {
    path: String,

    #[arg(long)]
    out: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct BundleArgs {
    folder: String,

    #[arg(long)]
    out: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ConvertError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ConvertError) -> u8 {
    match error.status() {
        ErrorStatus::ClientError | ErrorStatus::NotFound => 2,
        ErrorStatus::ServerError => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    let store = OutputStore::new(config.output_dir.clone());

    match cli.command {
        Commands::Convert(args) => {
            let app = App::from_config(config);
            let report = app.convert(Some(args.file.as_path()), args.name.as_deref(), &LogSink)?;
            JsonOutput::print_report(&report).into_diagnostic()?;
        }
        Commands::Ls(args) => {
            let listing = store.list(&args.path)?;
            JsonOutput::print_listing(&listing).into_diagnostic()?;
        }
        Commands::Images(args) => {
            let images = store.list_images(&args.folder)?;
            JsonOutput::print_images(&images).into_diagnostic()?;
        }
        Commands::Cat(args) => {
            let bytes = store.fetch(&args.path)?;
            match args.out {
                Some(out) => write_atomic(out.as_std_path(), &bytes)?,
                None => std::io::stdout().write_all(&bytes).into_diagnostic()?,
            }
        }
        Commands::Bundle(args) => {
            let bundle = store.bundle(Some(&args.folder))?;
            let out = args
                .out
                .unwrap_or_else(|| Utf8PathBuf::from(bundle.file_name.clone()));
            write_atomic(out.as_std_path(), &bundle.bytes)?;
            tracing::info!(path = %out, bytes = bundle.bytes.len(), "wrote bundle");
        }
    }

    Ok(())
}
