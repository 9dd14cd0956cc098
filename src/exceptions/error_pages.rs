//! Custom HTML error pages loaded from a directory at startup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

/// `{status}.html` pages keyed by status code.
#[derive(Clone, Debug, Default)]
pub struct ErrorPages {
    pages: Arc<HashMap<u16, Bytes>>,
}

impl ErrorPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `4xx.html`/`5xx.html` file in `dir`. A missing or
    /// unreadable directory yields an empty set.
    pub fn from_directory(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref();

        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Error pages directory {} unavailable: {}", path.display(), e);
                return Self::new();
            }
        };

        let mut pages = HashMap::new();

        for file_path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
            if file_path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }

            let status_code: u16 = match file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
            {
                Some(code) if (400..600).contains(&code) => code,
                _ => continue,
            };

            match std::fs::read(&file_path) {
                Ok(content) => {
                    tracing::debug!(
                        "Loaded error page: {} ({} bytes)",
                        file_path.display(),
                        content.len()
                    );
                    pages.insert(status_code, Bytes::from(content));
                }
                Err(e) => {
                    tracing::warn!("Failed to read error page {}: {}", file_path.display(), e);
                }
            }
        }

        if !pages.is_empty() {
            let mut codes: Vec<_> = pages.keys().copied().collect();
            codes.sort_unstable();
            tracing::info!("Loaded {} error pages: {:?}", pages.len(), codes);
        }

        Self {
            pages: Arc::new(pages),
        }
    }

    pub fn get(&self, status_code: u16) -> Option<&Bytes> {
        self.pages.get(&status_code)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }
}
