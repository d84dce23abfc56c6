use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tinyr2::cli::Args;
use tinyr2::{
    collect_image_files, load_env_file, logger, plan_tasks, Config, Pipeline, PipelineOptions,
    R2Storage, TinifyClient,
};

const EXIT_TASK_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_TASK_FAILED),
        Err(e) => {
            tinyr2::error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Returns whether every file made it to the bucket.
fn run(args: &Args) -> anyhow::Result<bool> {
    tinyr2::info!("🤖 Starting TinyR2");

    if load_env_file(&args.env_file)? {
        tinyr2::verbose!("Loaded environment from {:?}", args.env_file);
    }
    let config = Config::from_env()
        .and_then(|config| config.with_overrides(&args.overrides()))
        .context("Invalid configuration")?;
    tinyr2::verbose!("{:?}", config);

    let files = collect_image_files(&config.images_dir)?;
    let tasks = plan_tasks(files, &config.prefix)?;
    if tasks.is_empty() {
        tinyr2::warn!("No image files found in {:?}", config.images_dir);
        return Ok(true);
    }

    tinyr2::info!("📁 Input: {:?}", config.images_dir);
    tinyr2::info!("🪣 Bucket: {}", config.bucket_name);
    tinyr2::info!(
        "📊 Found {} image files, using {} worker threads",
        tasks.len(),
        config.num_threads
    );

    let compressor = TinifyClient::from_config(&config)?;
    let store = R2Storage::from_config(&config)?;
    tinyr2::verbose!("Tinify endpoint: {}", compressor.endpoint());
    tinyr2::verbose!("Storage bucket: {}", store.bucket_name());
    let options = PipelineOptions {
        num_threads: config.num_threads,
        remove_originals: config.remove_originals,
        show_progress: !logger::is_quiet(),
    };

    let report = Pipeline::new(&compressor, &store, options).run(tasks)?;
    report.print_summary();

    if report.is_success() {
        tinyr2::info!("🎉 Finished TinyR2");
    }
    Ok(report.is_success())
}
