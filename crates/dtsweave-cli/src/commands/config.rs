use crate::cli::{effective_config, package_name, project_dir, Overrides};
use anyhow::{Context, Result};
use clap::Subcommand;
use dtsweave_config::ConfigManager;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a commented dtsweave.toml into the project directory
    Init {
        /// Module name to put in the file (defaults to package.json's name)
        #[arg(short = 'n', long)]
        module_name: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,

    /// Show config file path
    Path,
}

pub fn handle_config_command(
    cmd: ConfigCommand,
    project: &Path,
    explicit: Option<&Path>,
) -> Result<()> {
    let project = project_dir(project)?;
    match cmd {
        ConfigCommand::Init { module_name, force } => {
            init_config(&project, explicit, module_name, force)
        }
        ConfigCommand::Show => show_config(&project, explicit),
        ConfigCommand::Path => show_config_path(&project, explicit),
    }
}

fn config_file(project: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ConfigManager::config_path(project))
}

fn init_config(
    project: &Path,
    explicit: Option<&Path>,
    module_name: Option<String>,
    force: bool,
) -> Result<()> {
    let config_path = config_file(project, explicit);

    if config_path.exists() && !force {
        println!("Config already exists at: {}", config_path.display());
        println!("To reinitialize, pass --force.");
        return Ok(());
    }

    let module_name = module_name
        .or_else(|| package_name(project))
        .or_else(|| {
            project
                .file_name()
                .and_then(|n| n.to_str())
                .map(|s| s.to_string())
        })
        .context("No module name given and none found in package.json")?;

    ConfigManager::init_at(&config_path, &module_name, force)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("✓ Initialized config at: {}", config_path.display());
    Ok(())
}

fn show_config(project: &Path, explicit: Option<&Path>) -> Result<()> {
    let config = effective_config(project, explicit, Overrides::default())?;
    let toml_str = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", toml_str);
    Ok(())
}

fn show_config_path(project: &Path, explicit: Option<&Path>) -> Result<()> {
    let config_path = config_file(project, explicit);
    if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{} (not created yet)", config_path.display());
    }
    Ok(())
}
