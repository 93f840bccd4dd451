use std::sync::RwLock;
use std::path::Path;
use std::fs;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use toml::Table;

static GLOBAL_CONFIG: OnceCell<RwLock<Table>> = OnceCell::new();

/// Loads the TOML file at `path` into the process-wide store.
/// A missing file yields an empty store, so every section falls back to its defaults.
pub fn init<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();

    let content = if path.exists() {
        log::info!("Loading config from {:?}", path);
        fs::read_to_string(path)?
    } else {
        log::warn!("Config file not found at {:?}, using defaults.", path);
        String::new()
    };

    init_from_str(&content)
}

/// Replaces the store with the parsed `content`. Calling it again reloads.
pub fn init_from_str(content: &str) -> anyhow::Result<()> {
    let table: Table = toml::from_str(content).unwrap_or_else(|e| {
        log::error!("Config syntax error: {}, using empty config.", e);
        Table::new()
    });

    let store = GLOBAL_CONFIG.get_or_init(|| RwLock::new(Table::new()));
    let mut guard = store
        .write()
        .map_err(|_| anyhow::anyhow!("Config store poisoned"))?;
    *guard = table;
    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

/// Deserializes section `[key]`, falling back to `T::default()` when the store
/// is not initialized, the section is absent, or it does not match `T`.
pub fn get<T: DeserializeOwned + Default>(key: &str) -> T {
    let Some(store) = GLOBAL_CONFIG.get() else {
        log::debug!("Config store not initialized, section '[{}]' uses defaults.", key);
        return T::default();
    };
    let Ok(read_guard) = store.read() else {
        log::error!("Config store poisoned, section '[{}]' uses defaults.", key);
        return T::default();
    };

    if let Some(value) = read_guard.get(key) {
        value.clone().try_into().unwrap_or_else(|e| {
            log::warn!("Config section '[{}]' mismatch: {}. Using default.", key, e);
            T::default()
        })
    } else {
        T::default()
    }
}
