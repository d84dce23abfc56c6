pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod storage;
pub mod tinify;
pub mod utils;

pub use batch::{build_object_key, collect_image_files, is_image_file, plan_tasks, Task};
pub use config::{load_env_file, Config, ConfigOverrides};
pub use error::{
    CompressionError, ConfigError, EnumerationError, Error, Result, TaskError, UploadError,
};
pub use pipeline::{BatchReport, Outcome, Pipeline, PipelineOptions, UploadStats};
pub use storage::{ObjectStore, R2Storage};
pub use tinify::{Compressor, TinifyClient};
