use anyhow::Result;
use blockvault_devices::{CapacityTable, CACHE_TIERS, DEFAULT_CAPACITY, DEFAULT_TRANSFER_AMOUNT};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/automation.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Requested capacity per cache tier; clamped during resolution.
    /// Tier 0 is the creative tier and ignores this value.
    pub cache_capacity: [u32; CACHE_TIERS],
    /// Default per-tick input quantity for new buffers (0 to 64).
    pub buffer_amount_input: u32,
    /// Default per-tick output quantity for new buffers (0 to 64).
    pub buffer_amount_output: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            buffer_amount_input: DEFAULT_TRANSFER_AMOUNT,
            buffer_amount_output: DEFAULT_TRANSFER_AMOUNT,
        }
    }
}

impl AutomationConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AutomationConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AutomationConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Automation config not found at {}. Using defaults",
                        path.display()
                    );
                }
                AutomationConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Resolve the clamped capacity table once at startup.
    pub fn capacity_table(&self) -> CapacityTable {
        CapacityTable::resolve(self.cache_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AutomationConfig::load_from_path(Path::new("/nonexistent/automation.toml"));
        assert_eq!(cfg.cache_capacity, DEFAULT_CAPACITY);
        assert_eq!(cfg.buffer_amount_input, DEFAULT_TRANSFER_AMOUNT);
    }

    #[test]
    fn save_and_reload_roundtrip() {
        use std::time::{SystemTime, UNIX_EPOCH};
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = env::temp_dir().join(format!("blockvault_cfg_{}/automation.toml", timestamp));

        let mut cfg = AutomationConfig::default();
        cfg.cache_capacity[1] = 20_000;
        cfg.buffer_amount_output = 16;
        cfg.save_to_path(&path).unwrap();

        let loaded = AutomationConfig::load_from_path(&path);
        assert_eq!(loaded.cache_capacity[1], 20_000);
        assert_eq!(loaded.buffer_amount_output, 16);

        let table = loaded.capacity_table();
        assert_eq!(table.capacity(1), 20_000);

        if let Some(parent) = path.parent() {
            fs::remove_dir_all(parent).ok();
        }
    }
}
