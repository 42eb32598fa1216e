use crate::logger;
use crate::GlobalOpts;
use clap::Subcommand;
use colored::Colorize;
use spexpack_config::Config;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the current configuration values
    Show,
    /// Set a configuration key
    Set { key: String, value: String },
    /// Print the configuration file path
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, opts: GlobalOpts) {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => match Config::load() {
            Ok(config) => {
                println!("{}", "Configuration:".bold().green());
                if config.is_empty() {
                    if opts.verbosity_level() > 0 {
                        println!("  {}", "(empty)".yellow());
                    }
                } else {
                    for (key, value) in config.values_iter() {
                        println!("  {}: {}", key.cyan(), value);
                    }
                }
            }
            Err(e) => {
                logger::error(&format!("Failed to load config: {}", e));
            }
        },
        ConfigAction::Set { key, value } => match Config::load() {
            Ok(mut config) => {
                if matches!(key.as_str(), "git-path" | "default-python" | "platform") {
                    config.set(&key, value.clone());
                    match config.save() {
                        Ok(()) => {
                            logger::success(&format!("Set {} = {}", key, value));
                        }
                        Err(e) => {
                            logger::error(&format!("Failed to save config: {}", e));
                        }
                    }
                } else {
                    logger::error(&format!(
                        "Unknown config key: {}. Currently supported keys: git-path, default-python, platform",
                        key
                    ));
                }
            }
            Err(e) => {
                logger::error(&format!("Failed to load config: {}", e));
            }
        },
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
    }
}
