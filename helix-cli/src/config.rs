//! Configuration handling for Helix CLI
//!
//! Supports loading configuration from helix.toml files with CLI argument overrides.

use anyhow::{Result, Context};
use helix_core::session::SessionConfig;
use helix_core::GenomicPos;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "helix.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default genome assembly id
    #[serde(default = "default_genome")]
    pub genome: String,

    /// Organism whose assemblies `helix genomes` lists by default
    #[serde(default = "default_organism")]
    pub organism: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Widest range that may be fetched at once, in bases
    #[serde(default = "default_max_view_range")]
    pub max_view_range: GenomicPos,

    /// Width of the range shown when a gene is first opened
    #[serde(default = "default_initial_window")]
    pub initial_window: GenomicPos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// UCSC Genome Browser REST API
    #[serde(default = "default_ucsc_base_url")]
    pub ucsc_base_url: String,

    /// NCBI E-utilities
    #[serde(default = "default_eutils_base_url")]
    pub eutils_base_url: String,

    /// NCBI clinical tables (gene search)
    #[serde(default = "default_clinical_tables_base_url")]
    pub clinical_tables_base_url: String,

    /// Variant-effect predictor endpoint; analysis is unavailable without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of ClinVar records per gene
    #[serde(default = "default_max_variants")]
    pub max_variants: usize,
}

// Default value functions
fn default_genome() -> String { "hg38".to_string() }
fn default_organism() -> String { "Human".to_string() }
fn default_max_view_range() -> GenomicPos { helix_core::DEFAULT_MAX_VIEW_RANGE }
fn default_initial_window() -> GenomicPos { 10_000 }
fn default_ucsc_base_url() -> String { "https://api.genome.ucsc.edu".to_string() }
fn default_eutils_base_url() -> String { "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string() }
fn default_clinical_tables_base_url() -> String { "https://clinicaltables.nlm.nih.gov".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_variants() -> usize { 20 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            genome: default_genome(),
            organism: default_organism(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_view_range: default_max_view_range(),
            initial_window: default_initial_window(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            ucsc_base_url: default_ucsc_base_url(),
            eutils_base_url: default_eutils_base_url(),
            clinical_tables_base_url: default_clinical_tables_base_url(),
            predictor_url: None,
            timeout_secs: default_timeout_secs(),
            max_variants: default_max_variants(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => match Self::discover() {
                Some(path) => {
                    log::info!("Loading configuration from: {}", path.display());
                    Self::load_from_file(&path)?
                }
                None => {
                    log::info!("Using default configuration");
                    Self::default()
                }
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// ./helix.toml, then the user config directory.
    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("helix").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if self.view.max_view_range <= 0 {
            anyhow::bail!("view.max_view_range must be positive, got {}", self.view.max_view_range);
        }
        if self.view.initial_window <= 0 {
            anyhow::bail!("view.initial_window must be positive, got {}", self.view.initial_window);
        }
        Ok(())
    }

    /// Session settings for a genome, honoring a command-line override.
    pub fn session_config(&self, genome_override: Option<&str>) -> SessionConfig {
        SessionConfig {
            genome_id: genome_override.unwrap_or(&self.general.genome).to_string(),
            max_view_range: self.view.max_view_range,
        }
    }
}
