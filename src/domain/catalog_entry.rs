use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{CatalogError, Result};

const BOX_NAME_FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// One game record from the catalog manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    #[serde(rename = "id")]
    pub identifier: String,
    pub engine: String,
}

impl CatalogEntry {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        engine: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            identifier: identifier.into(),
            engine: engine.into(),
        }
    }

    /// Build an entry from its manifest object form.
    pub fn from_representation(value: &serde_json::Value) -> Result<Self> {
        let entry: CatalogEntry = serde_json::from_value(value.clone())
            .map_err(|e| CatalogError::ManifestParse(e.to_string()))?;
        entry.validate()?;
        Ok(entry)
    }

    pub fn representation(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.identifier,
            "title": self.title,
            "engine": self.engine,
        })
    }

    pub fn full_title(&self) -> String {
        if self.engine.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.engine)
        }
    }

    pub fn icon_url(&self, base: &Url) -> Result<Url> {
        icon_under(base, &self.identifier)
    }

    /// Engine-wide icon used when the per-game icon is missing.
    pub fn fallback_icon_url(&self, base: &Url) -> Result<Url> {
        icon_under(base, &self.engine)
    }

    /// Title made safe for use as a file or folder name.
    pub fn default_box_name(&self) -> String {
        let name: String = self
            .title
            .chars()
            .map(|c| {
                if BOX_NAME_FORBIDDEN.contains(&c) || c.is_control() {
                    '-'
                } else {
                    c
                }
            })
            .collect();
        let name = name.trim().trim_matches('.');

        if name.is_empty() {
            self.identifier.clone()
        } else {
            name.to_string()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(CatalogError::ManifestParse(format!(
                "entry '{}' has an empty id",
                self.title
            )));
        }
        Ok(())
    }
}

/// `<base>/<name>.png`, with `name` percent-encoded as a single path segment.
fn icon_under(base: &Url, name: &str) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| CatalogError::Other(format!("icon base URL cannot hold a path: {}", base)))?
        .pop_if_empty()
        .push(&format!("{}.png", name));
    Ok(url)
}

/// Parse a manifest payload: a JSON array of entry objects, in order.
///
/// Any malformed entry rejects the whole manifest.
pub fn parse_manifest(body: &[u8]) -> Result<Vec<CatalogEntry>> {
    let entries: Vec<CatalogEntry> =
        serde_json::from_slice(body).map_err(|e| CatalogError::ManifestParse(e.to_string()))?;

    for entry in &entries {
        entry.validate()?;
    }

    Ok(entries)
}

pub fn to_manifest(entries: &[CatalogEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).map_err(|e| CatalogError::ManifestParse(e.to_string()))
}
