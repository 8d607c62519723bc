//! OPM guide excerpts for prompt grounding.
//!
//! `PdfReferenceLibrary` reads `<dir>/<resource>.pdf`, extracts its text on
//! the blocking pool, collapses whitespace, and caps the result to a
//! character budget. Capped text is cached per (resource, budget). Any
//! failure degrades to an empty excerpt; grounding is best-effort.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::classification::RatingSystem;

pub const FES_PRIMARY_STANDARD: &str = "fes-primary-standard";
pub const GSSG_GUIDE: &str = "gssg";

/// The reference document for a rating system.
pub fn resource_for(system: RatingSystem) -> &'static str {
    match system {
        RatingSystem::Fes => FES_PRIMARY_STANDARD,
        RatingSystem::Gssg => GSSG_GUIDE,
    }
}

#[async_trait]
pub trait ReferenceTextProvider: Send + Sync {
    /// At most `budget` characters of `resource`, or `""` when unavailable.
    async fn excerpt(&self, resource: &str, budget: usize) -> String;
}

pub struct PdfReferenceLibrary {
    dir: PathBuf,
    cache: RwLock<HashMap<(String, usize), String>>,
}

impl PdfReferenceLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !dir.is_dir() {
            warn!(
                "Reference directory {} not found; prompts will run without OPM excerpts",
                dir.display()
            );
        }
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path_for(&self, resource: &str) -> Option<PathBuf> {
        let valid = !resource.is_empty()
            && resource
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{resource}.pdf")))
    }
}

#[async_trait]
impl ReferenceTextProvider for PdfReferenceLibrary {
    async fn excerpt(&self, resource: &str, budget: usize) -> String {
        let key = (resource.to_string(), budget);
        if let Some(text) = self.cache.read().await.get(&key) {
            return text.clone();
        }

        let Some(path) = self.path_for(resource) else {
            warn!("Rejected reference resource name '{resource}'");
            return String::new();
        };
        if !path.is_file() {
            warn!("Unknown reference resource '{resource}' ({})", path.display());
            return String::new();
        }

        let Some(raw) = extract(&path).await else {
            return String::new();
        };
        let text = prepare_excerpt(&raw, budget);
        info!(
            "Loaded reference '{}' ({} of {} chars)",
            resource,
            text.chars().count(),
            raw.chars().count()
        );

        self.cache.write().await.insert(key, text.clone());
        text
    }
}

async fn extract(path: &Path) -> Option<String> {
    let owned = path.to_path_buf();
    match tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned)).await {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            warn!("Failed to extract text from {}: {e}", path.display());
            None
        }
        Err(e) => {
            warn!("spawn_blocking failed extracting {}: {e}", path.display());
            None
        }
    }
}

/// Collapses whitespace runs to single spaces and keeps the first `budget`
/// characters.
pub fn prepare_excerpt(raw: &str, budget: usize) -> String {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match normalized.char_indices().nth(budget) {
        Some((cut, _)) => {
            debug!("Reference text capped at {budget} chars");
            normalized[..cut].trim_end().to_string()
        }
        None => normalized,
    }
}
