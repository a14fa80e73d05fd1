//! dtsweave CLI - bundles TypeScript declaration files.

mod cli;
mod commands;
mod formatters;

use anyhow::Result;
use clap::Parser;
use dtsweave_core::DeclarationStyle;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dtsweave", version)]
#[command(about = "Bundles TypeScript declaration files into a single public surface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Project directory; file names are resolved against it
    #[arg(short, long, value_name = "DIR", default_value = ".", global = true)]
    project: PathBuf,

    /// Configuration file path (defaults to <project>/dtsweave.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Entry declaration file, relative to the project directory
    #[arg(short, long, value_name = "FILE")]
    entry: Option<PathBuf>,

    /// Name the bundle is published under
    ///
    /// Falls back to the `name` field of the project's package.json.
    #[arg(short = 'n', long, value_name = "NAME")]
    module_name: Option<String>,

    /// Export of the entry module to publish ("*" publishes everything)
    #[arg(long, value_name = "NAME")]
    export: Option<String>,

    /// Also publish the bundle under a global name, "A.B.C" or "C"
    #[arg(long, value_name = "NAME")]
    root_name: Option<String>,

    /// Output directory, relative to the project directory
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Output layout
    #[arg(long, value_enum)]
    style: Option<StyleArg>,

    /// Identifier used where the export name `default` must be spelled out
    #[arg(long, value_name = "IDENT")]
    default_name: Option<String>,

    /// Binding name of the index file's `import .. = require(..)`
    #[arg(long, value_name = "IDENT")]
    import_binding_name: Option<String>,

    /// Remove exports that nothing reachable from the entry uses
    #[arg(long)]
    strip_unused_exports: bool,

    /// List files, edges, unused exports and cycles instead of bundling
    #[arg(long)]
    list: bool,

    /// Bundle without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long = "output", value_enum, default_value = "human")]
    format: OutputFormat,

    /// Output JSON format (alias for --output json)
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Manage the project's dtsweave.toml
    Config {
        #[command(subcommand)]
        command: commands::ConfigCommand,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StyleArg {
    Module,
    Namespace,
}

impl From<StyleArg> for DeclarationStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Module => DeclarationStyle::Module,
            StyleArg::Namespace => DeclarationStyle::Namespace,
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 2)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Config { command }) => {
            commands::handle_config_command(command, &cli.project, cli.config.as_deref())
        }
        None => {
            let format = if cli.json {
                OutputFormat::Json
            } else {
                cli.format
            };
            let options = cli::RunOptions {
                project: cli.project,
                config: cli.config,
                overrides: cli::Overrides {
                    entry: cli.entry,
                    module_name: cli.module_name,
                    export: cli.export,
                    root_name: cli.root_name,
                    out_dir: cli.out_dir,
                    style: cli.style.map(DeclarationStyle::from),
                    default_name: cli.default_name,
                    import_binding_name: cli.import_binding_name,
                    strip_unused_exports: cli.strip_unused_exports,
                },
                dry_run: cli.dry_run,
                format,
            };
            if cli.list {
                cli::list::run_list(&options)
            } else {
                cli::pack::run_pack(&options)
            }
        }
    }
}
