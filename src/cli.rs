use crate::config::ConfigOverrides;
use crate::constants::DEFAULT_ENV_FILE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tinyr2",
    about = "Compress images with TinyPNG and upload them to Cloudflare R2",
    long_about = "tinyr2 compresses every image in a folder through the TinyPNG API and uploads \
                  the results to an S3-compatible bucket such as Cloudflare R2, using a pool of \
                  worker threads. Credentials and settings come from the environment or a .env file.",
    version,
    after_help = "ENVIRONMENT:\n  \
    TINIFY_TOKEN, BUCKET_NAME, R2_ENDPOINT_URL, R2_ACCESS_KEY_ID, R2_SECRET_ACCESS_KEY (required)\n  \
    PREFIX, R2_REGION, NUM_THREADS, IMAGES_DIR, REMOVE_ORIGINALS, TINIFY_ENDPOINT (optional)\n\n\
    EXAMPLES:\n  \
    tinyr2\n  \
    tinyr2 -i ./photos -j 4\n  \
    tinyr2 --env-file prod.env --remove-originals"
)]
pub struct Args {
    #[arg(
        long,
        default_value = DEFAULT_ENV_FILE,
        help = "File to load environment variables from",
        long_help = "Dotenv file read before the environment. Variables that are already set \
                     are not overridden. A missing file is ignored."
    )]
    pub env_file: PathBuf,

    #[arg(
        short = 'i',
        long,
        help = "Directory containing the images (default: ./images)",
        long_help = "Overrides IMAGES_DIR. Only files directly inside the directory are processed."
    )]
    pub input: Option<PathBuf>,

    #[arg(
        short = 'j',
        long,
        help = "Number of worker threads (default: 10)",
        long_help = "Overrides NUM_THREADS. Must be at least 1."
    )]
    pub threads: Option<usize>,

    #[arg(
        long,
        help = "Delete each local image after it was uploaded",
        long_help = "Same as REMOVE_ORIGINALS=true. Files that failed are never deleted."
    )]
    pub remove_originals: bool,

    #[arg(short = 'q', long, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, help = "Print per-file details", conflicts_with = "quiet")]
    pub verbose: bool,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            images_dir: self.input.clone(),
            num_threads: self.threads,
            remove_originals: self.remove_originals,
        }
    }
}
