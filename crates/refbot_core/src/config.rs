use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Emitted when a site defines no substitute text of its own.
pub const DEFAULT_SUBSTITUTE: &str = "<references />";
/// Heading used for a brand-new section when a site lists no preferred one.
pub const DEFAULT_SECTION_TITLE: &str = "References";

/// Per-site lookup tables for the references placer. Constructed once at
/// startup and passed by reference; never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteConfig {
    /// Headings that already qualify as references containers, preferred
    /// display name first.
    #[serde(default)]
    pub references_sections: Vec<String>,
    /// Headings a new references section should be created in front of,
    /// tried in priority order.
    #[serde(default)]
    pub place_before_sections: Vec<String>,
    /// Template names whose invocation counts as a references marker.
    #[serde(default)]
    pub references_templates: Vec<String>,
    /// Text to insert instead of the native tag, when the wiki prefers a
    /// template call.
    pub references_substitute: Option<String>,
    /// The substitute already renders a visible title, so new sections skip
    /// the heading wrapper.
    #[serde(default)]
    pub no_title_required: bool,
    /// Category namespace names recognized when stripping trailing
    /// boilerplate. Empty means the canonical `Category` only.
    #[serde(default)]
    pub category_namespaces: Vec<String>,
}

impl SiteConfig {
    pub fn substitute(&self) -> &str {
        self.references_substitute
            .as_deref()
            .unwrap_or(DEFAULT_SUBSTITUTE)
    }

    pub fn preferred_section_title(&self) -> &str {
        self.references_sections
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_SECTION_TITLE)
    }

    pub fn category_namespaces(&self) -> Vec<&str> {
        if self.category_namespaces.is_empty() {
            vec!["Category"]
        } else {
            self.category_namespaces
                .iter()
                .map(String::as_str)
                .collect()
        }
    }
}

/// All known sites, keyed `family:code` (e.g. `wikipedia:en`).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteRegistry {
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

impl SiteRegistry {
    /// Built-in tables for the sites the bot is normally run against.
    pub fn builtin() -> Self {
        let mut sites = BTreeMap::new();
        sites.insert(
            "wikipedia:en".to_string(),
            SiteConfig {
                references_sections: vec![
                    "References".to_string(),
                    "Footnotes".to_string(),
                    "Notes".to_string(),
                ],
                place_before_sections: vec![
                    "Further reading".to_string(),
                    "External links".to_string(),
                    "See also".to_string(),
                    "Notes".to_string(),
                ],
                references_templates: vec![
                    "Reflist".to_string(),
                    "Refs".to_string(),
                    "FootnotesSmall".to_string(),
                    "Reference".to_string(),
                    "Ref-list".to_string(),
                    "Reference list".to_string(),
                    "References-small".to_string(),
                    "Reflink".to_string(),
                    "Footnotes".to_string(),
                ],
                references_substitute: None,
                no_title_required: false,
                category_namespaces: Vec::new(),
            },
        );
        sites.insert(
            "blaseball:en".to_string(),
            SiteConfig {
                references_sections: vec![
                    "References".to_string(),
                    "Footnotes".to_string(),
                    "Notes".to_string(),
                ],
                place_before_sections: vec![
                    "External links".to_string(),
                    "See also".to_string(),
                    "Fan Works".to_string(),
                ],
                references_templates: vec!["Reflist".to_string()],
                references_substitute: None,
                no_title_required: false,
                category_namespaces: Vec::new(),
            },
        );
        Self { sites }
    }

    /// Look up a site; unknown sites degrade to an empty config so the
    /// placer falls through its rules instead of failing.
    pub fn site(&self, family: &str, code: &str) -> SiteConfig {
        self.sites
            .get(&format!("{family}:{code}"))
            .cloned()
            .unwrap_or_default()
    }
}

/// Load a SiteRegistry from a TOML file, layered over the built-in tables.
/// A missing file yields the built-ins unchanged; file entries win on key
/// collisions.
pub fn load_registry(config_path: &Path) -> Result<SiteRegistry> {
    let mut registry = SiteRegistry::builtin();
    if !config_path.exists() {
        return Ok(registry);
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: SiteRegistry = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    registry.sites.extend(parsed.sites);
    Ok(registry)
}

/// Resolve the registry path: env REFBOT_CONFIG > explicit argument > None.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<std::path::PathBuf> {
    if let Ok(value) = env::var("REFBOT_CONFIG") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(std::path::PathBuf::from(trimmed));
        }
    }
    explicit.map(Path::to_path_buf)
}
