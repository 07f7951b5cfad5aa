use breaktime_core::{Config, ConfigError};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Setting name (e.g. "small_break_interval_min", "work_hours_start")
        key: String,
    },
    /// Change one setting and save
    Set {
        key: String,
        value: String,
    },
    /// Print every setting as JSON
    List,
    /// Overwrite the config file with defaults
    Reset,
    /// Check the config file without starting the scheduler
    Validate,
}

fn lookup(config: &Config, key: String) -> Result<String, ConfigError> {
    config.get(&key).ok_or(ConfigError::UnknownKey(key))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            println!("{}", lookup(&Config::load()?, key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            let before = config.work_method.clone();
            config.set(&key, &value)?;
            config.save()?;
            if config.work_method != before {
                println!("{key} = {value} (work method is now {})", config.work_method);
            } else {
                println!("{key} = {value}");
            }
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("{} reset to defaults", Config::path()?.display());
        }
        ConfigAction::Validate => {
            let path = Config::path()?;
            Config::load_from(&path)?;
            println!("{} is valid", path.display());
        }
    }
    Ok(())
}
