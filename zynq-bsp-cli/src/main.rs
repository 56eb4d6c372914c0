use clap::{ArgGroup, CommandFactory, Parser};
use convenient_bitbake::{
    link_recipe_dir, Bitbake, DirectoryContext, RecipeVariable, ShellRunner,
};
use convenient_git::Git2Cloner;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod bootstrap;
mod config;

use bootstrap::bootstrap;
use config::BspConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wrapper for executing bitbake tasks of the Xilinx Zynq BSP.
///
/// Run it from the top of the BSP checkout; exactly one operation per call.
#[derive(Parser, Debug)]
#[command(name = "zynq-bsp", version, disable_help_flag = true)]
#[command(group(
    ArgGroup::new("operation")
        .args(["component", "source_link", "build_link", "install_link", "fetch", "download_deps", "help"])
))]
struct Opts {
    /// Component to build
    #[arg(short = 'c', long, value_name = "TARGET")]
    component: Option<String>,

    /// Create symlink links/sources to the source folder of TARGET
    #[arg(short = 's', long, value_name = "TARGET")]
    source_link: Option<String>,

    /// Create symlink links/builds to the build folder of TARGET
    #[arg(short = 'b', long, value_name = "TARGET")]
    build_link: Option<String>,

    /// Create symlink links/install to the install folder of TARGET
    #[arg(short = 'i', long, value_name = "TARGET")]
    install_link: Option<String>,

    /// Install host packages and fetch the BSP layer repositories
    #[arg(short = 'f', long)]
    fetch: bool,

    /// Download the sources of every recipe TARGET depends on
    #[arg(short = 'g', long, value_name = "TARGET")]
    download_deps: Option<String>,

    /// Show help
    #[arg(short = 'h', long)]
    help: bool,

    /// BSP configuration file (defaults to ./zynq-bsp.yml when present)
    #[arg(long, env = "ZYNQ_BSP_CONFIG")]
    config: Option<PathBuf>,

    /// Print debug information
    #[arg(short = 'd', long)]
    debug: bool,
}

/// The single thing one invocation does
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Build(String),
    /// Target and the dump prefix of the directory to link (`S=`, `B=`, `D=`)
    Link(String, &'static str),
    Bootstrap,
    DownloadDependencies(String),
}

impl Opts {
    fn operation(&self) -> Option<Operation> {
        if let Some(target) = &self.component {
            return Some(Operation::Build(target.clone()));
        }
        if let Some(target) = &self.source_link {
            return Some(Operation::Link(target.clone(), "S="));
        }
        if let Some(target) = &self.build_link {
            return Some(Operation::Link(target.clone(), "B="));
        }
        if let Some(target) = &self.install_link {
            return Some(Operation::Link(target.clone(), "D="));
        }
        if let Some(target) = &self.download_deps {
            return Some(Operation::DownloadDependencies(target.clone()));
        }
        if self.fetch {
            return Some(Operation::Bootstrap);
        }
        None
    }
}

fn usage() -> String {
    Opts::command().render_help().to_string()
}

fn init_tracing(debug: bool) {
    const CRATES: [&str; 3] = ["zynq_bsp", "convenient_bitbake", "convenient_git"];

    let directives = |level: &str| {
        CRATES
            .iter()
            .map(|krate| format!("{krate}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    };

    let filter = if debug {
        EnvFilter::new(directives("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info")))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(opts: &Opts, operation: Operation) -> Result<(), BoxError> {
    let ctx = DirectoryContext::from_top_dir(std::env::current_dir()?);
    let config = BspConfig::resolve(opts.config.as_deref(), &ctx.top_dir)?;
    debug!("{:?}", ctx);

    let bitbake = Bitbake::new(ShellRunner::new()).with_setup_script(&config.setup_script);

    match operation {
        Operation::Build(target) => {
            let output = bitbake.build(&ctx, &target)?;
            print!("{output}");
            info!("Built component {}", target);
        }
        Operation::Link(target, prefix) => {
            let variable: RecipeVariable = prefix.parse()?;
            let folder = link_recipe_dir(&bitbake, &ctx, &target, variable)?;
            println!("{}", folder.display());
        }
        Operation::Bootstrap => {
            let report = bootstrap(&ctx, &config, bitbake.runner(), &Git2Cloner)?;
            println!(
                "host packages: {} installed, {} already present",
                report.installed.len(),
                report.already_installed.len()
            );
            println!(
                "repositories: {} cloned, {} already present",
                report.cloned.len(),
                report.skipped.len()
            );
        }
        Operation::DownloadDependencies(target) => {
            let report = bitbake.fetch_dependencies(&ctx, &target)?;
            println!("fetched {} recipes", report.fetched.len());
            if !report.failed.is_empty() {
                return Err(format!(
                    "failed to fetch {} recipes: {}",
                    report.failed.len(),
                    report.failed.join(", ")
                )
                .into());
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                clap::error::ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    // help counts as a failed run so scripts do not mistake it for work done
    if opts.help {
        println!("{}", usage());
        return ExitCode::FAILURE;
    }

    let Some(operation) = opts.operation() else {
        eprintln!("missing argument\n\n{}", usage());
        return ExitCode::FAILURE;
    };

    init_tracing(opts.debug);

    match run(&opts, operation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
