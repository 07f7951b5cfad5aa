use breaktime_core::{Config, WorkMethodPreset};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List the built-in work methods
    List,
    /// Apply a work method to the saved config
    Apply {
        /// Preset name (e.g. "pomodoro", "52-17")
        name: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PresetAction::List => {
            let current = Config::load_or_default().work_method;
            println!(
                "  {:<10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                "name", "small/min", "small/sec", "big/min", "big len", "eyes/min"
            );
            for preset in WorkMethodPreset::all() {
                let marker = if preset.name == current { '*' } else { ' ' };
                println!(
                    "{marker} {:<10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    preset.name,
                    preset.small_break_interval_min,
                    preset.small_break_duration_sec,
                    preset.big_break_interval_min,
                    preset.big_break_duration_min,
                    preset.eye_exercise_interval_min,
                );
            }
        }
        PresetAction::Apply { name } => {
            let mut config = Config::load()?;
            config.apply_preset(&name)?;
            config.save()?;
            println!("applied preset {}", config.work_method);
        }
    }
    Ok(())
}
