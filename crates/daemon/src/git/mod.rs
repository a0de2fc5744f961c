// Git operations: command layer and the commit/push/init sequences.

pub mod sync;
pub mod worker;
