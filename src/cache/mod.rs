use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File cache for competition extracts, two tiers: `raw/` holds the
/// extraction collaborator's payloads untouched, `parsed/` holds batches
/// already shaped into `RawBatch` JSON. The pipeline reads parsed
/// batches; raw files are kept so a batch can be reshaped without
/// re-scraping.
pub struct Cache {
    raw_dir: PathBuf,
    parsed_dir: PathBuf,
}

impl Cache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        let raw_dir = cache_dir.join("raw");
        let parsed_dir = cache_dir.join("parsed");

        fs::create_dir_all(&raw_dir).context("Failed to create raw cache directory")?;
        fs::create_dir_all(&parsed_dir).context("Failed to create parsed cache directory")?;

        Ok(Self {
            raw_dir,
            parsed_dir,
        })
    }

    pub fn save_raw(&self, id: &str, data: &Value) -> Result<()> {
        let file_path = self.raw_dir.join(format!("{id}.json"));
        self.write_json(&file_path, data)?;
        info!("Saved raw extract to cache: {}", file_path.display());
        Ok(())
    }

    pub fn load_raw(&self, id: &str) -> Result<Option<Value>> {
        self.read_json_opt(&self.raw_dir.join(format!("{id}.json")))
    }

    pub fn save_parsed<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let file_path = self.parsed_dir.join(format!("{key}.json"));
        self.write_json(&file_path, data)?;
        info!("Saved parsed batch to cache: {}", file_path.display());
        Ok(())
    }

    pub fn load_parsed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        self.read_json_opt(&self.parsed_dir.join(format!("{key}.json")))
    }

    /// Keys of every parsed batch on disk, sorted for a stable run order.
    pub fn list_parsed(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.parsed_dir).context("Failed to read parsed cache")? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        fs::write(path, json).context("Failed to write cache file")?;
        Ok(())
    }

    fn read_json_opt<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path)?;
        let data = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {:?}. Starts with: {}",
                path,
                truncate_at_char_boundary(&json, 200)
            )
        })?;
        Ok(Some(data))
    }
}

/// Cut a payload preview without splitting a multi-byte character.
fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    let mut end = text.len().min(max_bytes);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_korean_payload_reports_without_panicking() {
        let dir = std::env::temp_dir().join(format!("fencing-cache-test-{}", std::process::id()));
        let cache = Cache::new(&dir).unwrap();

        // Long enough that a byte-indexed cut would land mid-character.
        let body = "전국선수권대회 ".repeat(40);
        fs::write(dir.join("parsed").join("bad.json"), &body).unwrap();

        let result = cache.load_parsed::<Value>("bad");
        assert!(result.is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "에뻬".repeat(100);
        let cut = truncate_at_char_boundary(&text, 200);
        assert!(cut.len() <= 200);
        assert!(text.starts_with(cut));
    }
}
