//! Project document: maps, layers, colour ramps and layer symbology.
//!
//! The pipeline only talks to the [`Project`] trait. [`ProjectDocument`] is
//! the local implementation, persisted as a JSON file.

use crate::error::ProjectError;
use crate::ramp::{builtin_ramps, ColorRamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, ProjectError>;

/// How raster values are mapped to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colorizer {
    /// Continuous stretch across the ramp.
    Stretch,
}

/// Classification method for class breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Jenks natural breaks
    #[default]
    NaturalBreaks,
    /// Equal interval
    EqualInterval,
    /// Quantile
    Quantile,
    /// Standard deviation
    StandardDeviation,
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassificationMethod::NaturalBreaks => "natural breaks",
            ClassificationMethod::EqualInterval => "equal interval",
            ClassificationMethod::Quantile => "quantile",
            ClassificationMethod::StandardDeviation => "standard deviation",
        })
    }
}

/// Rendering settings of a raster layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbology {
    pub colorizer: Colorizer,
    pub color_ramp: ColorRamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_count: Option<u32>,
    /// Percent, 0 = opaque.
    #[serde(default)]
    pub transparency: u8,
}

impl Symbology {
    /// Stretch colourizer with the given ramp and nothing else set.
    pub fn stretch(color_ramp: ColorRamp) -> Self {
        Self {
            colorizer: Colorizer::Stretch,
            color_ramp,
            classification: None,
            break_count: None,
            transparency: 0,
        }
    }

    pub fn with_classification(mut self, method: ClassificationMethod, break_count: u32) -> Self {
        self.classification = Some(method);
        self.break_count = Some(break_count);
        self
    }

    pub fn with_transparency(mut self, transparency: u8) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.transparency > 100 {
            return Err(ProjectError::InvalidSymbology(format!(
                "transparency {} exceeds 100",
                self.transparency
            )));
        }
        if self.break_count == Some(0) {
            return Err(ProjectError::InvalidSymbology(
                "break count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Operations the pipeline needs from a GIS project.
pub trait Project {
    /// Names of all maps in the project.
    fn map_names(&self) -> Vec<String>;

    /// Layer names of a map, top to bottom.
    fn layer_names(&self, map: &str) -> Result<Vec<String>>;

    /// Add a dataset to a map as a new layer and return the layer name.
    fn add_data(&mut self, map: &str, data_path: &Path) -> Result<String>;

    /// Look up a colour ramp in the project's catalogue.
    fn color_ramp(&self, name: &str) -> Result<ColorRamp>;

    /// Replace a layer's symbology.
    fn set_layer_symbology(&mut self, map: &str, layer: &str, symbology: Symbology) -> Result<()>;

    /// Current symbology of a layer, if any has been set.
    fn layer_symbology(&self, map: &str, layer: &str) -> Result<Option<Symbology>>;

    /// Persist the project.
    fn save(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub data_source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbology: Option<Symbology>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// Serialized form of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub maps: Vec<MapDocument>,
    #[serde(default = "builtin_ramps")]
    pub color_ramps: Vec<ColorRamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// JSON-backed project document.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    path: PathBuf,
    data: ProjectData,
}

impl ProjectDocument {
    /// New in-memory project with one empty map and the built-in ramps.
    /// Nothing is written until [`Project::save`].
    pub fn create<P: AsRef<Path>>(path: P, map_name: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            data: ProjectData {
                maps: vec![MapDocument {
                    name: map_name.to_string(),
                    layers: Vec::new(),
                }],
                color_ramps: builtin_ramps(),
                saved_at: None,
            },
        }
    }

    /// Load an existing project document.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| ProjectError::Io {
            path: path.clone(),
            source,
        })?;
        let data = serde_json::from_str(&text)?;
        Ok(Self { path, data })
    }

    /// Open the document at `path`, or create one with a single map.
    pub fn open_or_create<P: AsRef<Path>>(path: P, map_name: &str) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "Opening project");
            Self::open(path)
        } else {
            info!(path = %path.display(), map = map_name, "Creating project");
            Ok(Self::create(path, map_name))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    /// Names of all ramps in the catalogue.
    pub fn ramp_names(&self) -> Vec<String> {
        self.data.color_ramps.iter().map(|r| r.name.clone()).collect()
    }

    fn map(&self, map: &str) -> Result<&MapDocument> {
        self.data
            .maps
            .iter()
            .find(|m| m.name == map)
            .ok_or_else(|| ProjectError::MapNotFound(map.to_string()))
    }

    fn map_mut(&mut self, map: &str) -> Result<&mut MapDocument> {
        self.data
            .maps
            .iter_mut()
            .find(|m| m.name == map)
            .ok_or_else(|| ProjectError::MapNotFound(map.to_string()))
    }
}

impl Project for ProjectDocument {
    fn map_names(&self) -> Vec<String> {
        self.data.maps.iter().map(|m| m.name.clone()).collect()
    }

    fn layer_names(&self, map: &str) -> Result<Vec<String>> {
        Ok(self.map(map)?.layers.iter().map(|l| l.name.clone()).collect())
    }

    fn add_data(&mut self, map: &str, data_path: &Path) -> Result<String> {
        let name = data_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let map_doc = self.map_mut(map)?;

        if let Some(existing) = map_doc.layers.iter().find(|l| l.data_source == data_path) {
            debug!(map, layer = %existing.name, "Data source already in map");
            return Ok(existing.name.clone());
        }

        // New layers go on top, as a GIS client would draw them.
        map_doc.layers.insert(
            0,
            Layer {
                name: name.clone(),
                data_source: data_path.to_path_buf(),
                symbology: None,
            },
        );
        debug!(map, layer = %name, source = %data_path.display(), "Added layer");
        Ok(name)
    }

    fn color_ramp(&self, name: &str) -> Result<ColorRamp> {
        self.data
            .color_ramps
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| ProjectError::RampNotFound(name.to_string()))
    }

    fn set_layer_symbology(&mut self, map: &str, layer: &str, symbology: Symbology) -> Result<()> {
        symbology.validate()?;
        let map_doc = self.map_mut(map)?;
        let target = map_doc
            .layers
            .iter_mut()
            .find(|l| l.name == layer)
            .ok_or_else(|| ProjectError::LayerNotFound {
                map: map.to_string(),
                layer: layer.to_string(),
            })?;
        target.symbology = Some(symbology);
        Ok(())
    }

    fn layer_symbology(&self, map: &str, layer: &str) -> Result<Option<Symbology>> {
        self.map(map)?
            .layers
            .iter()
            .find(|l| l.name == layer)
            .map(|l| l.symbology.clone())
            .ok_or_else(|| ProjectError::LayerNotFound {
                map: map.to_string(),
                layer: layer.to_string(),
            })
    }

    fn save(&mut self) -> Result<()> {
        self.data.saved_at = Some(Utc::now());
        let io_err = |source| ProjectError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json).map_err(io_err)?;
        debug!(path = %self.path.display(), "Saved project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectDocument {
        ProjectDocument::create("unused.json", "Map")
    }

    #[test]
    fn test_add_data_uses_dataset_name() {
        let mut p = project();
        let name = p.add_data("Map", Path::new("/proj/S.gdb/Auto_Hill_Dataset")).unwrap();
        assert_eq!(name, "Auto_Hill_Dataset");
        p.add_data("Map", Path::new("/proj/S.gdb/Auto_El_Dataset")).unwrap();
        assert_eq!(p.layer_names("Map").unwrap(), vec!["Auto_El_Dataset", "Auto_Hill_Dataset"]);
    }

    #[test]
    fn test_add_same_source_twice_keeps_one_layer() {
        let mut p = project();
        p.add_data("Map", Path::new("S.gdb/Auto_El_Dataset")).unwrap();
        p.add_data("Map", Path::new("S.gdb/Auto_El_Dataset")).unwrap();
        assert_eq!(p.layer_names("Map").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_map_and_ramp() {
        let mut p = project();
        assert!(matches!(
            p.add_data("Other", Path::new("x")),
            Err(ProjectError::MapNotFound(_))
        ));
        assert!(matches!(
            p.color_ramp("No Such Ramp"),
            Err(ProjectError::RampNotFound(_))
        ));
        assert!(p.color_ramp("Elevation #1").is_ok());
    }

    #[test]
    fn test_symbology_replaced_not_merged() {
        let mut p = project();
        p.add_data("Map", Path::new("S.gdb/Auto_El_Dataset")).unwrap();
        let ramp = p.color_ramp("Elevation #1").unwrap();
        let full = Symbology::stretch(ramp.clone())
            .with_classification(ClassificationMethod::NaturalBreaks, 18)
            .with_transparency(40);
        p.set_layer_symbology("Map", "Auto_El_Dataset", full).unwrap();

        let plain = Symbology::stretch(ramp);
        p.set_layer_symbology("Map", "Auto_El_Dataset", plain.clone()).unwrap();
        assert_eq!(p.layer_symbology("Map", "Auto_El_Dataset").unwrap(), Some(plain));
    }

    #[test]
    fn test_invalid_symbology_rejected() {
        let mut p = project();
        p.add_data("Map", Path::new("S.gdb/L")).unwrap();
        let ramp = p.color_ramp("Black to White").unwrap();
        let err = p
            .set_layer_symbology("Map", "L", Symbology::stretch(ramp).with_transparency(101))
            .unwrap_err();
        assert!(matches!(err, ProjectError::InvalidSymbology(_)));
        assert_eq!(p.layer_symbology("Map", "L").unwrap(), None);
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("project.json");
        let mut p = ProjectDocument::open_or_create(&path, "Map").unwrap();
        p.add_data("Map", Path::new("S.gdb/Auto_El_Dataset")).unwrap();
        p.save().unwrap();

        let reopened = ProjectDocument::open_or_create(&path, "Ignored").unwrap();
        assert_eq!(reopened.map_names(), vec!["Map"]);
        assert_eq!(reopened.layer_names("Map").unwrap(), vec!["Auto_El_Dataset"]);
        assert!(reopened.data().saved_at.is_some());
    }
}
