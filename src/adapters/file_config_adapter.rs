//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive (stored lowercase).

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(|e| std::io::Error::other(e))?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn sections(&self) -> Vec<String> {
        self.config.sections()
    }
}
