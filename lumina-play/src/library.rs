use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use walkdir::WalkDir;
use lumina_dialog::script::loader::DialogDocument;

/// Dialogue documents found under a directory, keyed by file stem.
pub struct ScriptLibrary {
    scripts: BTreeMap<String, PathBuf>,
}

impl ScriptLibrary {
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        log::info!("Scanning dialog scripts at: {:?}", root);

        let mut scripts = BTreeMap::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|e| e != "toml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            if let Some(prev) = scripts.insert(stem.to_string(), path.to_path_buf()) {
                log::warn!("Script '{}' at {:?} shadows {:?}", stem, path, prev);
            }
        }

        log::info!("Found {} dialog script(s)", scripts.len());
        Ok(Self { scripts })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(|k| k.as_str())
    }

    /// Loads by name, or by path when `name` points at a file.
    pub fn load(&self, name: &str) -> Result<DialogDocument> {
        let path = match self.scripts.get(name) {
            Some(path) => path.clone(),
            None if Path::new(name).is_file() => PathBuf::from(name),
            None => anyhow::bail!("No dialog script named '{}'", name),
        };
        DialogDocument::from_path(&path).with_context(|| format!("Failed to load script: {:?}", path))
    }
}
