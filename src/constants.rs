pub const DEFAULT_NUM_THREADS: usize = 10;
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const DEFAULT_TINIFY_ENDPOINT: &str = "https://api.tinify.com";
pub const TINIFY_USER: &str = "api";
pub const TINIFY_COUNT_HEADER: &str = "Compression-Count";

pub const DEFAULT_R2_REGION: &str = "auto";

pub const OPTIMIZED_SUFFIX: &str = "-optimized";

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

// Environment keys
pub const ENV_TINIFY_TOKEN: &str = "TINIFY_TOKEN";
pub const ENV_TINIFY_ENDPOINT: &str = "TINIFY_ENDPOINT";
pub const ENV_PREFIX: &str = "PREFIX";
pub const ENV_BUCKET_NAME: &str = "BUCKET_NAME";
pub const ENV_R2_ENDPOINT_URL: &str = "R2_ENDPOINT_URL";
pub const ENV_R2_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
pub const ENV_R2_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
pub const ENV_R2_REGION: &str = "R2_REGION";
pub const ENV_NUM_THREADS: &str = "NUM_THREADS";
pub const ENV_IMAGES_DIR: &str = "IMAGES_DIR";
pub const ENV_REMOVE_ORIGINALS: &str = "REMOVE_ORIGINALS";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";

/// Formats Tinify accepts and this tool forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
        }
    }
}
