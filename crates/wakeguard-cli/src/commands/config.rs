use clap::Subcommand;
use wakeguard_core::{Config, Result};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting (e.g. "lock.mode", "clock.tick_interval_ms")
    Get { key: String },
    /// Change one setting; range-checked before it is written
    Set { key: String, value: String },
    /// Print every setting as JSON
    List,
    /// Restore defaults: explicit toggle, activation fallback on, 1s clock
    Reset,
}

pub fn run(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            println!("{}", Config::load()?.get_value(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            // Echo what was stored, e.g. `lock.mode = immediate`.
            println!("{key} = {}", config.get_value(&key)?);
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!(
                "config reset: lock.mode = {}, clock.tick_interval_ms = {}",
                config.get_value("lock.mode")?,
                config.clock.tick_interval_ms
            );
        }
    }
    Ok(())
}
