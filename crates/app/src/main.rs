use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stem_mixer_core::{
    extract_container, mix_directory, DryRunRunner, ExtractConfig, MixConfig, ProcessRunner,
    ToolRunner,
};
use tracing_subscriber::EnvFilter;

fn main() -> stem_mixer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mix {
            input,
            output,
            loops,
            workers,
            dry_run,
        } => {
            let config = MixConfig {
                input_dir: input,
                output_dir: output,
                loops,
                workers: Some(workers),
            };
            run_mix(&config, dry_run)
        }
        Commands::Extract {
            container,
            output,
            aio,
            no_intro,
            no_loop,
        } => {
            let config = ExtractConfig {
                container,
                output_dir: output,
                aio,
                intro: !no_intro,
                loop_section: !no_loop,
            };
            run_extract(&config)
        }
    }
}

fn run_mix(config: &MixConfig, dry_run: bool) -> stem_mixer_core::Result<()> {
    let runner: &dyn ToolRunner = if dry_run {
        &DryRunRunner
    } else {
        std::fs::create_dir_all(&config.output_dir)?;
        &ProcessRunner
    };

    let report = mix_directory(config, runner)?;
    for outcome in &report.outcomes {
        println!("{outcome}");
    }
    for file in &report.skipped_files {
        println!("skipped invalid file {}: {}", file.path.display(), file.reason);
    }
    Ok(())
}

fn run_extract(config: &ExtractConfig) -> stem_mixer_core::Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let report = extract_container(config, &ProcessRunner)?;
    tracing::info!(
        streams = report.streams,
        exported = report.exported,
        failed = report.failed,
        "extraction complete"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract and mix multiregion audio stems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mix a directory of `<track>_<channel>_<type>.<ext>` stems into one
    /// file per track.
    Mix {
        /// Path to the directory containing the input files.
        #[arg(short, long)]
        input: PathBuf,
        /// Path to the directory to save the output files.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Number of times the loop section repeats after the intro.
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        loops: u32,
        /// Number of workers to use for processing. Negative uses every core.
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        workers: i64,
        /// Log the mixer commands instead of running them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract stereo stems from a multiregion container, e.g. 0xeda82cc0.srsa.
    Extract {
        /// Container file to split.
        container: PathBuf,
        /// Directory the stems are written to.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Also export all-in-one song stems.
        #[arg(long)]
        aio: bool,
        /// Skip the intro stems.
        #[arg(long)]
        no_intro: bool,
        /// Skip the loop stems.
        #[arg(long)]
        no_loop: bool,
    },
}
