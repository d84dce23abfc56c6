use crate::batch::Task;
use crate::constants::{PROGRESS_BAR_TEMPLATE, SUCCESS_PREFIX};
use crate::error::{Result, TaskError};
use crate::storage::ObjectStore;
use crate::tinify::Compressor;
use crate::utils::{calculate_compression_ratio, format_file_size};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub original_size: u64,
    pub compressed_size: u64,
}

/// Recorded result of one task.
#[derive(Debug)]
pub struct Outcome {
    pub path: PathBuf,
    pub key: String,
    pub result: std::result::Result<UploadStats, TaskError>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every outcome of a run, in task order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// True when no task failed. An empty run counts as a success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn bytes_before(&self) -> u64 {
        self.stats().map(|s| s.original_size).sum()
    }

    pub fn bytes_after(&self) -> u64 {
        self.stats().map(|s| s.compressed_size).sum()
    }

    fn stats(&self) -> impl Iterator<Item = &UploadStats> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn print_summary(&self) {
        let before = self.bytes_before();
        let after = self.bytes_after();

        crate::info!("\n📊 Upload Summary:");
        crate::info!("  📁 Total files: {}", self.total());
        crate::info!("  {} Uploaded: {}", SUCCESS_PREFIX, self.succeeded());
        crate::info!(
            "  📊 Total original size: {} ({} bytes)",
            format_file_size(before),
            before
        );
        crate::info!(
            "  📈 Total compressed size: {} ({} bytes)",
            format_file_size(after),
            after
        );
        crate::info!(
            "  🎯 Overall compression ratio: {:.1}%",
            calculate_compression_ratio(before, after)
        );
        crate::info!("  ⏱️  Total time: {:.2?}", self.elapsed);

        if self.failed() > 0 {
            crate::warn!("Failed files: {}", self.failed());
            for failure in self.failures() {
                crate::error!("{}", failure);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub num_threads: usize,
    pub remove_originals: bool,
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            num_threads: crate::constants::DEFAULT_NUM_THREADS,
            remove_originals: false,
            show_progress: false,
        }
    }
}

/// Fixed-size worker pool driving compress-then-upload for each task.
pub struct Pipeline<'a, C: ?Sized, S: ?Sized> {
    compressor: &'a C,
    store: &'a S,
    options: PipelineOptions,
}

impl<'a, C, S> Pipeline<'a, C, S>
where
    C: Compressor + ?Sized,
    S: ObjectStore + ?Sized,
{
    pub fn new(compressor: &'a C, store: &'a S, options: PipelineOptions) -> Self {
        Self {
            compressor,
            store,
            options,
        }
    }

    /// Processes every task exactly once on `num_threads` workers.
    ///
    /// Task failures end up in the report. Only failing to build the pool is an
    /// error.
    pub fn run(&self, tasks: Vec<Task>) -> Result<BatchReport> {
        let start_time = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.num_threads.max(1))
            .thread_name(|i| format!("tinyr2-worker-{}", i))
            .build()?;

        let progress = self.progress_bar(tasks.len() as u64);

        let outcomes: Vec<Outcome> = pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| {
                    let outcome = self.process(task);
                    progress.inc(1);
                    outcome
                })
                .collect()
        });

        progress.finish_with_message("done");

        Ok(BatchReport {
            outcomes,
            elapsed: start_time.elapsed(),
        })
    }

    fn process(&self, task: Task) -> Outcome {
        let result = self.compress_and_upload(&task);

        match &result {
            Ok(stats) => {
                crate::verbose!(
                    "Uploaded {:?} as {} ({} -> {})",
                    task.path,
                    task.key,
                    format_file_size(stats.original_size),
                    format_file_size(stats.compressed_size)
                );
                if self.options.remove_originals {
                    if let Err(e) = fs::remove_file(&task.path) {
                        crate::warn!("Failed to remove {:?}: {}", task.path, e);
                    }
                }
            }
            Err(e) => crate::verbose!("{}", e),
        }

        Outcome {
            path: task.path,
            key: task.key,
            result,
        }
    }

    fn compress_and_upload(&self, task: &Task) -> std::result::Result<UploadStats, TaskError> {
        let original = fs::read(&task.path).map_err(|source| TaskError::Read {
            path: task.path.clone(),
            source,
        })?;

        let compressed =
            self.compressor
                .compress(&original)
                .map_err(|source| TaskError::Compression {
                    path: task.path.clone(),
                    source,
                })?;

        self.store
            .put(&task.key, &compressed, task.content_type())
            .map_err(|source| TaskError::Upload {
                path: task.path.clone(),
                source,
            })?;

        Ok(UploadStats {
            original_size: original.len() as u64,
            compressed_size: compressed.len() as u64,
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress
    }
}
