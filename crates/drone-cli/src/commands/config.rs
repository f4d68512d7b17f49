//! Settings file commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use drone_config::{SynthConfig, default_config_path};

use super::common::{SynthOptions, display_path};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective settings (file plus overrides) as TOML
    Show {
        #[command(flatten)]
        synth: SynthOptions,
    },

    /// Write a settings file with default values
    Init {
        /// Where to write (defaults to the user settings file)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the settings file location
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { synth } => {
            let config = synth.load()?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(default_config_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    display_path(&path)
                );
            }
            SynthConfig::default().save(&path)?;
            println!("Wrote {}", display_path(&path));
            Ok(())
        }
        ConfigCommand::Path => {
            let path = default_config_path();
            let status = if path.is_file() { "" } else { " (not created)" };
            println!("{}{status}", display_path(&path));
            Ok(())
        }
    }
}
