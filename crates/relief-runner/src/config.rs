//! Pipeline configuration loaded from YAML.
//!
//! ```yaml
//! regions: [n29w082, n29w081]
//! project_root: /maps/florida
//! store: Automated_Map
//! interactive: false
//! fetch:
//!   retries: 3
//! focal:
//!   statistic: median
//! symbology:
//!   transparency: 30
//! ```
//!
//! Relative `download_root` and `project_file` paths resolve against
//! `project_root`.

use crate::catalog::RegionCatalog;
use crate::error::ConfigError;
use relief_dem::{FetchOptions, Region, DEFAULT_ARCHIVE_BASE_URL, HILLSHADE_PREFIX, RASTER_EXTENSION};
use relief_toolbox::{ClassificationMethod, FocalParams, HillshadeParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Sections
// ============================================================================

/// Download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Skip regions whose tile is already on disk.
    pub skip_existing: bool,
    /// Extra attempts after a failed download.
    pub retries: u32,
    /// Delay before the first retry, doubled per attempt.
    pub retry_backoff_ms: u64,
    /// Ceiling for the retry delay.
    pub max_retry_backoff_ms: u64,
    /// Whole-request timeout; 0 waits indefinitely.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            skip_existing: false,
            retries: 2,
            retry_backoff_ms: 500,
            max_retry_backoff_ms: 30_000,
            timeout_secs: 300,
        }
    }
}

impl FetchConfig {
    /// Request timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Fetcher options for an archive.
    pub fn to_options(&self, archive_base_url: &str) -> FetchOptions {
        FetchOptions {
            archive_base_url: archive_base_url.to_string(),
            skip_existing: self.skip_existing,
            retries: self.retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_retry_backoff: Duration::from_millis(self.max_retry_backoff_ms),
        }
    }
}

/// Layer styling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbologyConfig {
    /// Ramp for the elevation layer.
    pub elevation_ramp: String,
    /// Ramp for the hillshade layer.
    pub hillshade_ramp: String,
    /// Elevation classification method.
    pub classification: ClassificationMethod,
    /// Elevation class break count.
    pub break_count: u32,
    /// Elevation layer transparency, percent.
    pub transparency: u8,
}

impl Default for SymbologyConfig {
    fn default() -> Self {
        Self {
            elevation_ramp: "Elevation #1".to_string(),
            hillshade_ramp: "Black to White".to_string(),
            classification: ClassificationMethod::NaturalBreaks,
            break_count: 18,
            transparency: 40,
        }
    }
}

// ============================================================================
// Pipeline configuration
// ============================================================================

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region identifiers, processed in this order.
    pub regions: Vec<String>,
    /// Project workspace; stores and outputs live under it.
    pub project_root: PathBuf,
    /// Where tiles are downloaded.
    pub download_root: PathBuf,
    /// Raster store name (without `.gdb`).
    pub store: String,
    /// Project document path.
    pub project_file: PathBuf,
    /// Map that receives the dataset layers.
    pub map_name: String,
    /// Base URL of the elevation archive.
    pub archive_base_url: String,
    /// Wait for the operator on failures and at the end.
    pub interactive: bool,
    /// Delete the raster store before fetching.
    pub clean_store: bool,
    pub fetch: FetchConfig,
    pub hillshade: HillshadeParams,
    pub focal: FocalParams,
    pub symbology: SymbologyConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            project_root: PathBuf::from("."),
            download_root: PathBuf::from("data"),
            store: "Automated_Map".to_string(),
            project_file: PathBuf::from("Automated_Map.json"),
            map_name: "Map".to_string(),
            archive_base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
            interactive: true,
            clean_store: false,
            fetch: FetchConfig::default(),
            hillshade: HillshadeParams::default(),
            focal: FocalParams::default(),
            symbology: SymbologyConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Check every setting and build the region catalog.
    pub fn validate(&self) -> Result<RegionCatalog, ConfigError> {
        let catalog = RegionCatalog::from_ids(self.regions.as_slice())?;

        if self.store.trim().is_empty() || self.store.contains(['/', '\\', ';']) {
            return Err(ConfigError::InvalidValue(format!(
                "store name '{}' must be non-empty and contain no path or list separators",
                self.store
            )));
        }
        if self.map_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("map_name is empty".into()));
        }
        if self.symbology.transparency > 100 {
            return Err(ConfigError::InvalidValue(format!(
                "symbology.transparency {} exceeds 100",
                self.symbology.transparency
            )));
        }
        if self.symbology.break_count == 0 {
            return Err(ConfigError::InvalidValue(
                "symbology.break_count must be at least 1".into(),
            ));
        }
        self.hillshade
            .validate()
            .map_err(|e| ConfigError::InvalidValue(format!("hillshade: {}", e)))?;
        if self.focal.radius == 0 {
            return Err(ConfigError::InvalidValue("focal.radius must be at least 1".into()));
        }

        Ok(catalog)
    }

    fn under_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Resolved download directory.
    pub fn download_dir(&self) -> PathBuf {
        self.under_root(&self.download_root)
    }

    /// Resolved project document path.
    pub fn project_path(&self) -> PathBuf {
        self.under_root(&self.project_file)
    }

    /// Directory hillshade rasters are written to before ingest.
    pub fn output_dir(&self) -> PathBuf {
        self.project_root.join("output")
    }

    /// Output path of a region's hillshade raster.
    pub fn hillshade_output(&self, region: &Region) -> PathBuf {
        self.output_dir()
            .join(format!("{}{}.{}", HILLSHADE_PREFIX, region.id(), RASTER_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_toolbox::FocalStatistic;

    #[test]
    fn test_defaults_match_source_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.store, "Automated_Map");
        assert_eq!(config.symbology.elevation_ramp, "Elevation #1");
        assert_eq!(config.symbology.hillshade_ramp, "Black to White");
        assert_eq!(config.symbology.break_count, 18);
        assert_eq!(config.symbology.transparency, 40);
        assert_eq!(config.focal, FocalParams::default());
        assert!(!config.fetch.skip_existing);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = PipelineConfig::from_yaml_str(
            r#"
regions: [n29w082, N29W081]
project_root: /maps
interactive: false
fetch:
  retries: 5
  timeout_secs: 0
focal:
  statistic: median
"#,
        )
        .unwrap();

        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.fetch.retries, 5);
        assert_eq!(config.fetch.retry_backoff_ms, 500);
        assert_eq!(
            config.fetch.to_options("http://a").max_retry_backoff,
            Duration::from_secs(30)
        );
        assert_eq!(config.fetch.timeout(), None);
        assert_eq!(config.focal.statistic, FocalStatistic::Median);
        assert_eq!(config.focal.radius, 1);
        assert_eq!(config.download_dir(), PathBuf::from("/maps/data"));
        assert_eq!(config.project_path(), PathBuf::from("/maps/Automated_Map.json"));

        let catalog = config.validate().unwrap();
        assert_eq!(catalog.ids(), vec!["n29w082", "n29w081"]);
    }

    #[test]
    fn test_validate_rejects() {
        let base = PipelineConfig {
            regions: vec!["n29w082".into()],
            ..PipelineConfig::default()
        };
        assert!(base.validate().is_ok());

        let empty = PipelineConfig::default();
        assert!(matches!(empty.validate(), Err(ConfigError::EmptyRegions)));

        let mut bad = base.clone();
        bad.regions.push("florida".into());
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidRegions(r)) if r == vec!["florida"]));

        let mut bad = base.clone();
        bad.symbology.transparency = 101;
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidValue(_))));

        let mut bad = base.clone();
        bad.symbology.break_count = 0;
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidValue(_))));

        let mut bad = base;
        bad.store = "a;b".into();
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_unknown_statistic_is_yaml_error() {
        let err = PipelineConfig::from_yaml_str("focal:\n  statistic: mode\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_hillshade_output_path() {
        let config = PipelineConfig {
            project_root: PathBuf::from("/maps"),
            ..PipelineConfig::default()
        };
        let region = Region::parse("n29w082").unwrap();
        assert_eq!(config.hillshade_output(&region), PathBuf::from("/maps/output/HS_n29w082.tif"));
    }
}
