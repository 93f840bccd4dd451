use std::fs;
use std::path::Path;
use serde::Serialize;
use lumina_dialog::DialogConfig;

use crate::config::SystemConfig;

#[derive(Serialize)]
struct FullConfig {
    system: SystemConfig,
    dialog: DialogConfig,
}

pub fn ensure_config_exists(path: &str) {
    if Path::new(path).exists() {
        return;
    }

    println!("Creating default configuration at '{}'...", path);

    let default_config = FullConfig {
        system: SystemConfig::default(),
        dialog: DialogConfig::default(),
    };

    let toml_str = match toml::to_string_pretty(&default_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to serialize default config: {}", e);
            return;
        }
    };

    if let Err(e) = fs::write(path, toml_str) {
        eprintln!("Failed to write config file: {}", e);
    } else {
        println!("Config file created successfully.");
    }
}
