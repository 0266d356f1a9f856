use poetry_buildpack::cli::{BuildArgs, CliArgs, Commands, DetectArgs};
use poetry_buildpack::cnb::{
    run_build, run_detect, BuildInvocation, DetectInvocation, PlanEntryResolver, EXIT_ERROR,
    EXIT_PASS,
};
use poetry_buildpack::pexec::CommandExecutable;
use poetry_buildpack::poetry::{
    PoetryBuilder, PoetryDetector, PoetryInstallProcess, PyProjectParser, SiteProcess,
};
use poetry_buildpack::postal::{DependencyService, HttpTransport};
use poetry_buildpack::util::{init_logging, parse_level, LoggingConfig};
use poetry_buildpack::{BuildpackConfig, NAME, VERSION};

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, Level};

fn main() {
    let args = CliArgs::parse_invocation();
    let config = BuildpackConfig::default();
    init_logging_from_args(&args, &config);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match run(&args, &config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            EXIT_ERROR
        }
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &BuildpackConfig) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };

    init_logging(LoggingConfig {
        level,
        use_json: config.log_json,
        ..Default::default()
    });
}

fn run(args: &CliArgs, config: &BuildpackConfig) -> Result<i32> {
    config.validate()?;
    debug!("{}", config);

    let cnb_path = buildpack_dir(config)?;
    let working_dir = env::current_dir().context("Failed to get current directory")?;

    match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args, cnb_path, working_dir),
        Commands::Build(build_args) => handle_build(build_args, config, cnb_path, working_dir),
    }
}

fn handle_detect(args: &DetectArgs, cnb_path: PathBuf, working_dir: PathBuf) -> Result<i32> {
    let detector = PoetryDetector::new(PyProjectParser::new());
    let invocation = DetectInvocation {
        working_dir,
        cnb_path,
        platform_dir: args.platform.clone(),
        plan_path: args.plan.clone(),
    };

    run_detect(&detector, &invocation).context("Detection failed")
}

fn handle_build(
    args: &BuildArgs,
    config: &BuildpackConfig,
    cnb_path: PathBuf,
    working_dir: PathBuf,
) -> Result<i32> {
    let stack = config.stack()?.to_string();

    let transport = HttpTransport::new(config.download_timeout())
        .context("Failed to initialize download client")?;
    let builder = PoetryBuilder::new(
        DependencyService::new(transport),
        PlanEntryResolver::new(),
        PoetryInstallProcess::new(CommandExecutable::new(&config.pip)),
        SiteProcess::new(CommandExecutable::new(&config.python)),
    );

    let invocation = BuildInvocation {
        working_dir,
        cnb_path,
        layers_dir: args.layers.clone(),
        platform_dir: args.platform.clone(),
        plan_path: args.plan.clone(),
        stack,
    };

    run_build(&builder, &invocation).context("Build failed")?;
    Ok(EXIT_PASS)
}

/// `CNB_BUILDPACK_DIR`, or the directory above the `bin/` holding this binary.
fn buildpack_dir(config: &BuildpackConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.buildpack_dir {
        return Ok(dir.clone());
    }

    let exe = env::current_exe().context("Failed to locate the buildpack binary")?;
    exe.parent()
        .and_then(|bin| bin.parent())
        .map(PathBuf::from)
        .with_context(|| {
            format!(
                "Cannot derive the buildpack directory from {}; set CNB_BUILDPACK_DIR",
                exe.display()
            )
        })
}
