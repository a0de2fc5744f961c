// Folder path handling shared by the config store, watcher, and CLI.

pub mod normalize;

pub use normalize::{folder_key, normalize_folder, PathError};
