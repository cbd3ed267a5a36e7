pub mod errors;

/// Last-segment fallback when a reference yields no usable file name.
pub const FALLBACK_FILE_NAME: &str = "image";

/// Extension of last resort for generated asset names.
pub const DEFAULT_EXTENSION: &str = "png";

/// Root of per-plugin sandboxed storage inside a graph's assets directory.
pub const PLUGIN_STORAGE_ROOT: &str = "assets/storages";
