//! Atempo CLI - scaffold Laravel and Django projects with Docker-based tooling

use anyhow::{bail, Context, Result};
use atempo_core::{
    ConsoleStepLogger, JsonFileRegistry, Options, Pipeline, ProjectRegistry, RunReport,
    ScaffoldError, YamlComposeGenerator,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "atempo")]
#[command(about = "CLI for scaffolding framework projects with Docker-based tooling")]
#[command(version)]
pub struct Args {
    /// Show command output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project
    Create(CreateArgs),
    /// List frameworks with available templates
    Frameworks(FrameworksArgs),
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Framework to scaffold (laravel, django)
    pub framework: String,

    /// Framework version (defaults to the framework's current major)
    pub version: Option<String>,

    /// Project name; the project is created in ./<name> instead of the current directory
    #[arg(short, long)]
    pub name: Option<String>,

    /// Local templates/frameworks directory to use instead of the bundled templates (for development use)
    #[arg(long = "template-dir", env = "ATEMPO_TEMPLATE_DIR")]
    pub template_dir: Option<PathBuf>,

    /// Project registry file
    #[arg(long, env = "ATEMPO_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Do not start compose services after installing
    #[arg(long = "no-services")]
    pub no_services: bool,

    /// Skip environment setup, services and framework setup commands
    #[arg(long = "skip-post-install")]
    pub skip_post_install: bool,

    /// Skip the Docker daemon check before a Docker-based installer
    #[arg(long = "skip-docker-check")]
    pub skip_docker_check: bool,

    /// Abort any external command running longer than this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct FrameworksArgs {
    /// Local templates/frameworks directory to list instead of the bundled templates
    #[arg(long = "template-dir", env = "ATEMPO_TEMPLATE_DIR")]
    pub template_dir: Option<PathBuf>,
}

impl CreateArgs {
    fn options(&self) -> Result<Options> {
        let mut options = Options::from_env().context("Failed to determine working directory")?;
        options.project_name = self.name.clone();
        options.template_dir = self.template_dir.clone();
        options.command_timeout = self.timeout.map(Duration::from_secs);
        options.check_docker = !self.skip_docker_check;
        options.start_services = !self.no_services;
        options.post_install = !self.skip_post_install;
        Ok(options)
    }

    /// Requested version, falling back to the framework profile's default
    fn version(&self) -> Result<String> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }
        match atempo_core::profile(&self.framework) {
            Some(profile) => Ok(profile.default_version().to_string()),
            None => bail!(
                "No default version for '{}'; pass one explicitly",
                self.framework
            ),
        }
    }

    /// A missing home directory surfaces later as a registration warning
    fn registry(&self) -> Box<dyn ProjectRegistry> {
        match &self.registry {
            Some(path) => Box::new(JsonFileRegistry::new(path.clone())),
            None => atempo_core::default_registry(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Create(create_args) => create(create_args, args.verbose).await,
        Command::Frameworks(list_args) => frameworks(list_args),
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}

async fn create(args: CreateArgs, verbose: bool) -> Result<ExitCode> {
    let version = args.version()?;
    let options = args.options()?;
    let registry = args.registry();

    cliclack::intro(format!("atempo create {} {}", args.framework, version))?;
    if let Some(dir) = &options.template_dir {
        cliclack::log::info(format!("Using local templates from {}", dir.display()))?;
    }

    let pipeline = Pipeline::new(
        options,
        Box::new(ConsoleStepLogger::new(verbose)),
        registry,
        Box::new(YamlComposeGenerator),
    );

    match pipeline.run(&args.framework, &version).await {
        Ok(report) => {
            print_report(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print_failure(&e)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_report(report: &RunReport) -> Result<()> {
    for warning in &report.warnings {
        cliclack::log::warning(warning.to_string())?;
    }
    if !report.warnings.is_empty() {
        cliclack::log::info(format!(
            "{} step(s) need attention before the project is fully usable",
            report.warnings.len()
        ))?;
    }

    cliclack::log::success(format!(
        "Copied {} template file(s)",
        report.copied.copied.len()
    ))?;

    let current = std::env::current_dir().ok();
    let mut next = String::from("Next steps:");
    if current.as_deref() != Some(report.project_dir.as_path()) {
        next.push_str(&format!("\n  cd {}", report.project_dir.display()));
    }
    next.push_str("\n  docker compose up -d");
    cliclack::note("", next)?;

    cliclack::outro(format!(
        "{} {} project {} is ready",
        report.framework,
        report.version,
        report.project_name.cyan()
    ))?;
    Ok(())
}

fn print_failure(error: &ScaffoldError) -> Result<()> {
    cliclack::log::error(format!("{} failed: {}", error.stage(), error))?;
    cliclack::outro_cancel("Project was not created")?;
    Ok(())
}

fn frameworks(args: FrameworksArgs) -> Result<ExitCode> {
    let mut options = Options::from_env().context("Failed to determine working directory")?;
    options.template_dir = args.template_dir;
    let resolver = options.resolver();

    let names = resolver.frameworks();
    if names.is_empty() {
        eprintln!("{}", "No framework templates found".yellow());
        return Ok(ExitCode::FAILURE);
    }
    for name in names {
        match atempo_core::profile(&name) {
            Some(profile) => {
                let (floor, ceiling) = profile.major_range();
                println!(
                    "{:<10} {} (versions {}-{}, default {})",
                    name.bold(),
                    profile.display_name(),
                    floor,
                    ceiling,
                    profile.default_version()
                );
            }
            None => println!("{}", name.bold()),
        }
    }
    Ok(ExitCode::SUCCESS)
}
