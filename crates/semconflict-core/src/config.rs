use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Unit the text diff primitive splits source into before aligning it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffGranularity {
    #[default]
    Lines,
    Words,
    Chars,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub granularity: DiffGranularity,
    /// Keep trivia-only and convergent conflicts in analysis output.
    #[serde(default)]
    pub report_trivia_conflicts: bool,
    #[serde(default = "default_true")]
    pub detect_shared_declarations: bool,
    #[serde(default)]
    pub extra_declaration_kinds: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            granularity: DiffGranularity::default(),
            report_trivia_conflicts: false,
            detect_shared_declarations: default_true(),
            extra_declaration_kinds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            log_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
