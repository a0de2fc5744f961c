// gac-common: shared types and utilities for the gac workspace

pub mod path;
pub mod types;
