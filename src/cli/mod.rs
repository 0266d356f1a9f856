pub mod commands;

pub use commands::{with_inferred_subcommand, BuildArgs, CliArgs, Commands, DetectArgs};
