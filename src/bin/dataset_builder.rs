use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nextclade_dataset_builder::build::Builder;
use nextclade_dataset_builder::error::BuildError;
use nextclade_dataset_builder::layout::Layout;

#[derive(Parser)]
#[command(name = "dataset-builder")]
#[command(about = "Rebuild the dataset publish tree and index.json from the data directory")]
#[command(version, author)]
struct Cli {}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(build) = report.downcast_ref::<BuildError>() {
            return ExitCode::from(map_exit_code(build));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BuildError) -> u8 {
    match error {
        BuildError::Parse { .. }
        | BuildError::MissingField { .. }
        | BuildError::DuplicateDataset { .. } => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Cli {} = Cli::parse();

    let layout = Layout::new()?;
    let builder = Builder::new(layout.clone());
    let summary = builder.run()?;

    println!(
        "indexed {} datasets ({} versions) -> {}",
        summary.datasets,
        summary.versions,
        layout.index_path()
    );
    Ok(())
}
