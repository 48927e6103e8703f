use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use minijinja::{Environment, Error, State};
use sha2::{Digest, Sha256};

/// Resolves `asset("css/admin.css")` in templates to a cache-busting URL
/// carrying the file's SHA-256.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::default(),
        }
    }

    pub fn asset_path(&self, path: &str) -> String {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned();
        if let Some(hashed_path) = cached {
            return hashed_path;
        }

        match fs::read(self.root.join(path)) {
            Ok(contents) => {
                let hash = Sha256::digest(contents);
                let hashed_path = format!("/static/{}?v={:x}", path, hash);
                self.cache
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(path.to_string(), hashed_path.clone());
                hashed_path
            }
            // Unknown files are not cached so they pick up a hash once they exist.
            Err(_) => format!("/static/{}", path),
        }
    }

    pub fn register(&self, env: &mut Environment<'_>) {
        let loader = self.clone();
        env.add_function("asset", move |_state: &State, path: String| -> Result<String, Error> {
            Ok(loader.asset_path(&path))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back_to_plain_path() {
        let loader = AssetLoader::new("does-not-exist");

        assert_eq!(loader.asset_path("css/admin.css"), "/static/css/admin.css");
    }

    #[test]
    fn existing_files_get_a_content_hash() {
        let loader = AssetLoader::new(env!("CARGO_MANIFEST_DIR")).clone();

        let path = loader.asset_path("Cargo.toml");

        assert!(path.starts_with("/static/Cargo.toml?v="));
        assert_eq!(path.len(), "/static/Cargo.toml?v=".len() + 64);
        assert_eq!(loader.asset_path("Cargo.toml"), path);
    }
}
