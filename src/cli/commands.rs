use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Cloud Native Buildpack that installs Poetry for Python projects
#[derive(Parser, Debug)]
#[command(
    name = "poetry-buildpack",
    about = "Cloud Native Buildpack that installs Poetry for Python projects",
    version,
    long_about = "Detects Python projects managed by Poetry and installs Poetry into a \
                  layer, exposing it on PYTHONPATH for later build steps.\n\n\
                  The lifecycle normally runs this binary through the bin/detect and \
                  bin/build symlinks of the buildpack."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Decide whether the buildpack applies to the working directory",
        long_about = "Reads pyproject.toml from the working directory. Exits 0 and writes \
                      the build plan when the project uses Poetry, 100 when it does not, \
                      1 on error.\n\n\
                      Examples:\n  \
                      poetry-buildpack detect /platform /tmp/plan.toml"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Install Poetry into the poetry layer",
        long_about = "Resolves Poetry from buildpack.toml, installs it with pip into \
                      <layers>/poetry and writes layer metadata and the bill of materials.\n\n\
                      Examples:\n  \
                      CNB_STACK_ID=io.buildpacks.stacks.bionic \\\n    \
                      poetry-buildpack build /layers/poetry-buildpack /platform /tmp/plan.toml"
    )]
    Build(BuildArgs),
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct DetectArgs {
    #[arg(value_name = "PLATFORM", help = "Platform directory")]
    pub platform: PathBuf,

    #[arg(value_name = "PLAN", help = "Build plan file to write")]
    pub plan: PathBuf,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    #[arg(value_name = "LAYERS", help = "Layers directory of this buildpack")]
    pub layers: PathBuf,

    #[arg(value_name = "PLATFORM", help = "Platform directory")]
    pub platform: PathBuf,

    #[arg(value_name = "PLAN", help = "Buildpack plan file to read")]
    pub plan: PathBuf,
}

impl CliArgs {
    /// Parses process arguments, honouring `bin/detect` and `bin/build`
    /// invocations.
    pub fn parse_invocation() -> Self {
        Self::parse_from(with_inferred_subcommand(std::env::args_os()))
    }
}

/// Inserts the subcommand when the program was started as `detect` or
/// `build`, so `bin/detect <platform> <plan>` parses like
/// `poetry-buildpack detect <platform> <plan>`.
pub fn with_inferred_subcommand<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();

    let phase = args
        .first()
        .and_then(|program| Path::new(program).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| matches!(*name, "detect" | "build"))
        .map(str::to_string);

    if let Some(phase) = phase {
        args.insert(1, OsString::from(phase));
    }

    args
}
