// gac-daemon library: folder watching, debounce, and git auto-commit engine.

pub mod config;
pub mod controller;
pub mod git;
pub mod security;
pub mod watcher;
