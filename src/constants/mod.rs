// App Constants
pub const APP_NAME: &str = "Media File Converter";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONFIG_DIR_NAME: &str = "mediaconvert";

// Engine virtual filesystem names
pub const INPUT_STEM: &str = "test";
pub const OUTPUT_STEM: &str = "output";

// Engine defaults
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_ENGINE_LOG_LEVEL: &str = "info";
pub const STDERR_TAIL_LINES: usize = 5;

// Download handling
pub const DEFAULT_RELEASE_DELAY_MS: u64 = 100;
pub const MAX_UNIQUE_NAME_ATTEMPTS: u32 = 1000;
pub const MAX_FILENAME_LEN: usize = 255;

// Target extension limits
pub const MAX_EXTENSION_LEN: usize = 16;

// UI polling while work is in flight
pub const REPAINT_INTERVAL_MS: u64 = 100;

// File picker hints (advisory only, "All files" is always offered too)
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico", "avif",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp", "ogv", "ts",
];

// Quick picks shown next to the output extension field
pub const COMMON_TARGET_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "gif", "mp3", "png"];

// Extension -> MIME type
pub const MIME_TYPES: &[(&str, &str)] = &[
    // Video
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
    ("ogv", "video/ogg"),
    ("ts", "video/mp2t"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("weba", "audio/webm"),
    // Image
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
];

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";
