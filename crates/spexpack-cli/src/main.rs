use clap::{Parser, Subcommand};
use spexpack::{
    commands::{
        check,
        config::{self, ConfigAction},
        init, resolve, show, version,
    },
    logger, GlobalOpts,
};
use spexpack_config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spexpack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Packaging manifest toolkit",
    long_about = "Spexpack is a CLI tool for inspecting, validating and resolving the packaging manifest of the SPEXone Level-0/Level-1 processing suite."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the spexpack tool
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Show the manifest record
    Show {
        /// Manifest file or directory (default: nearest pyproject.toml)
        path: Option<PathBuf>,
        /// Emit the record as JSON instead of the summary view
        #[arg(long)]
        json: bool,
    },
    /// Validate the manifest record
    Check {
        /// Manifest file or directory (default: nearest pyproject.toml)
        path: Option<PathBuf>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
        /// Audit every manifest below the given directory
        #[arg(short, long)]
        recursive: bool,
    },
    /// Resolve the dependency set for an interpreter
    Resolve {
        /// Manifest file or directory (default: nearest pyproject.toml)
        path: Option<PathBuf>,
        /// Interpreter version to resolve for, e.g. 3.9
        #[arg(short, long)]
        python: Option<String>,
        /// Platform to resolve for (linux, darwin, win32)
        #[arg(long)]
        platform: Option<String>,
        /// Emit the resolved set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve the package version from repository state
    Version {
        /// Manifest file or directory (default: nearest pyproject.toml)
        path: Option<PathBuf>,
        /// Keep the local tail (+g<node>) in the output
        #[arg(long)]
        full: bool,
    },
    /// Initialize a new manifest file
    Init {
        /// Optional filename for the manifest (default: pyproject.toml)
        file: Option<String>,
    },
}

fn fail(message: &str, opts: &GlobalOpts) -> ! {
    logger::error(message);
    if opts.verbosity_level() > 0 {
        logger::show_log_path();
    }
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    spexpack::init_tracing(cli.global.verbosity_level());

    if let Err(e) = Config::load().and_then(|mut cfg| cfg.ensure_git_path()) {
        logger::warn(&format!("Failed to setup CLI: {}", e));
    }

    match cli.command {
        Commands::Config { action } => {
            config::handle_config(action, cli.global);
        }
        Commands::Show { path, json } => {
            if let Err(e) = show::handle_show(path, json, &cli.global) {
                fail(&e, &cli.global);
            }
        }
        Commands::Check {
            path,
            strict,
            recursive,
        } => {
            if let Err(e) = check::handle_check(path, strict, recursive, &cli.global) {
                fail(&e, &cli.global);
            }
        }
        Commands::Resolve {
            path,
            python,
            platform,
            json,
        } => {
            if let Err(e) = resolve::handle_resolve(path, python, platform, json, &cli.global) {
                fail(&e, &cli.global);
            }
        }
        Commands::Version { path, full } => {
            if let Err(e) = version::handle_version(path, full, &cli.global) {
                fail(&e, &cli.global);
            }
        }
        Commands::Init { file } => {
            init::handle_init(file, cli.global);
        }
    }
}
