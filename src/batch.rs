use crate::constants::{ImageFormat, OPTIMIZED_SUFFIX, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::EnumerationError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One file's compress-then-upload unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub path: PathBuf,
    pub key: String,
    pub format: ImageFormat,
}

impl Task {
    /// Returns `None` for files whose extension is not a supported image format.
    pub fn new(path: PathBuf, prefix: &str) -> Option<Self> {
        let format = image_format(&path)?;
        let key = build_object_key(prefix, &path);
        Some(Self { path, key, format })
    }

    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Lists image files directly inside `input_dir`, sorted by path.
///
/// # Arguments
/// * `input_dir` - Directory to scan. Subdirectories are not descended into.
///
/// # Returns
/// * `Ok(files)` - Supported image files, possibly empty
/// * `Err(EnumerationError)` - If the directory is missing or unreadable
pub fn collect_image_files(input_dir: &Path) -> Result<Vec<PathBuf>, EnumerationError> {
    if !input_dir.exists() {
        return Err(EnumerationError::NotFound(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(EnumerationError::NotADirectory(input_dir.to_path_buf()));
    }

    let mut image_files = Vec::new();
    let walker = WalkDir::new(input_dir).min_depth(1).max_depth(1).into_iter();

    // The root itself may be hidden (e.g. a temp dir); only its children are filtered.
    let visible = |e: &walkdir::DirEntry| {
        e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
    };
    for entry in walker.filter_entry(visible) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if is_image_file(&path) {
            image_files.push(path);
        } else {
            crate::warn!("Not a valid image format, skipping {:?}", path);
        }
    }

    image_files.sort();
    Ok(image_files)
}

/// Turns the enumerated files into tasks with their remote keys.
///
/// Two files mapping to the same key (e.g. `a.JPG` and `a.jpg` on a
/// case-sensitive filesystem) would overwrite each other in the bucket, so the
/// whole run is refused before anything is uploaded.
pub fn plan_tasks(files: Vec<PathBuf>, prefix: &str) -> Result<Vec<Task>, EnumerationError> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut tasks = Vec::with_capacity(files.len());

    for task in files.into_iter().filter_map(|path| Task::new(path, prefix)) {
        if let Some(first) = seen.get(&task.key) {
            return Err(EnumerationError::DuplicateKey {
                key: task.key,
                first: first.clone(),
                second: task.path,
            });
        }
        seen.insert(task.key.clone(), task.path.clone());
        tasks.push(task);
    }

    Ok(tasks)
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn image_format(path: &Path) -> Option<ImageFormat> {
    path.extension()
        .and_then(|s| s.to_str())
        .and_then(ImageFormat::from_extension)
}

/// Builds `{prefix}/{stem}-optimized.{ext}`, or `{stem}-optimized.{ext}` when
/// the prefix is empty. `ext` is the file's own extension, lowercased.
pub fn build_object_key(prefix: &str, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = format!("{}{}.{}", stem, OPTIMIZED_SUFFIX, ext);

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}
