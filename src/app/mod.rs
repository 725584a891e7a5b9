// Application layer: startup ordering and process exit codes.

pub mod exit;
pub mod startup;

pub use exit::ExitStatus;
