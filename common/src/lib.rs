pub mod file_utils;
pub mod log_setup;

pub use file_utils::{has_extension, stable_path_hash, walk_files_with_extensions, write_atomic};
pub use log_setup::setup_logging;
