//! The ordered region catalog and mosaic input lists.

use crate::error::ConfigError;
use relief_dem::{RasterKind, Region};
use relief_toolbox::STORE_SUFFIX;
use std::collections::HashSet;
use tracing::warn;

/// Validated, duplicate-free regions in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    /// Build a catalog from raw identifiers.
    ///
    /// All malformed identifiers are reported together. Duplicates are
    /// logged and collapsed to their first occurrence.
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Self, ConfigError> {
        if ids.is_empty() {
            return Err(ConfigError::EmptyRegions);
        }

        let mut regions = Vec::with_capacity(ids.len());
        let mut invalid = Vec::new();
        let mut seen = HashSet::new();

        for raw in ids {
            let raw = raw.as_ref();
            match Region::parse(raw) {
                Ok(region) => {
                    if seen.insert(region.clone()) {
                        regions.push(region);
                    } else {
                        warn!(region = %region, "Duplicate region in list, ignoring repeat");
                    }
                }
                Err(_) => invalid.push(raw.to_string()),
            }
        }

        if !invalid.is_empty() {
            return Err(ConfigError::InvalidRegions(invalid));
        }
        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn ids(&self) -> Vec<&str> {
        self.regions.iter().map(Region::id).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// Mosaic input list for one raster kind.
    pub fn object_list(&self, store: &str, kind: RasterKind) -> Result<String, ConfigError> {
        join_object_names(store, kind.prefix(), &self.ids())
    }
}

impl<'a> IntoIterator for &'a RegionCatalog {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

/// Join names into a `;`-separated `<store>.gdb/<prefix><name>` list with
/// no trailing separator.
pub fn join_object_names<S: AsRef<str>>(
    store: &str,
    prefix: &str,
    names: &[S],
) -> Result<String, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::EmptyRegions);
    }
    Ok(names
        .iter()
        .map(|name| format!("{}{}/{}{}", store, STORE_SUFFIX, prefix, name.as_ref()))
        .collect::<Vec<_>>()
        .join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_two_regions() {
        let list = join_object_names("S", "HS_", &["a", "b"]).unwrap();
        assert_eq!(list, "S.gdb/HS_a;S.gdb/HS_b");
    }

    #[test]
    fn test_join_separator_count() {
        for n in 1..=6 {
            let names: Vec<String> = (0..n).map(|i| format!("r{i}")).collect();
            let list = join_object_names("S", "USGS_1_", &names).unwrap();
            assert_eq!(list.matches(';').count(), n - 1);
            assert!(!list.ends_with(';'));
        }
    }

    #[test]
    fn test_join_empty_is_configuration_error() {
        let names: [&str; 0] = [];
        assert!(matches!(
            join_object_names("S", "HS_", &names),
            Err(ConfigError::EmptyRegions)
        ));
    }

    #[test]
    fn test_duplicates_collapse_keeping_order() {
        let catalog = RegionCatalog::from_ids(&["n30w082", "n29w082", "N30W082"]).unwrap();
        assert_eq!(catalog.ids(), vec!["n30w082", "n29w082"]);
    }

    #[test]
    fn test_all_malformed_reported() {
        let err = RegionCatalog::from_ids(&["n29w082", "bad", "n99w999x"]).unwrap_err();
        match err {
            ConfigError::InvalidRegions(bad) => assert_eq!(bad, vec!["bad", "n99w999x"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_object_list_per_kind() {
        let catalog = RegionCatalog::from_ids(&["n29w082", "n29w081"]).unwrap();
        assert_eq!(
            catalog.object_list("Automated_Map", RasterKind::Elevation).unwrap(),
            "Automated_Map.gdb/USGS_1_n29w082;Automated_Map.gdb/USGS_1_n29w081"
        );
        assert_eq!(
            catalog.object_list("Automated_Map", RasterKind::Hillshade).unwrap(),
            "Automated_Map.gdb/HS_n29w082;Automated_Map.gdb/HS_n29w081"
        );
    }
}
