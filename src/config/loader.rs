//! File-based configuration loading
//!
//! A forecast configuration is a JSON document; the slot fee/distribution
//! matrix can also be kept in a CSV file with one row per slot.

use super::{ForecastConfig, ProductConfig, SlotFee};
use crate::error::{ForecastError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of a slot matrix CSV
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlotMatrixRow {
    pub duration: u32,
    pub slab: u64,
    pub slot: u32,
    pub fee_pct: f64,
    #[serde(default)]
    pub blocked: bool,
    pub distribution_pct: f64,
}

impl ForecastConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| ForecastError::io(path, e))?;
        Self::from_json_str(&contents)
    }
}

/// Load a slot matrix from a CSV file
pub fn load_slot_matrix(path: &Path) -> Result<Vec<SlotMatrixRow>> {
    let file = File::open(path).map_err(|e| ForecastError::io(path, e))?;
    load_slot_matrix_from_reader(file)
}

/// Load a slot matrix from any reader
pub fn load_slot_matrix_from_reader<R: Read>(reader: R) -> Result<Vec<SlotMatrixRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: SlotMatrixRow = result?;
        rows.push(row);
    }

    Ok(rows)
}

impl ProductConfig {
    /// Replace slot terms with the rows of a slot matrix.
    ///
    /// Every (duration, slab) named in the matrix has its slots replaced as a
    /// whole; durations and slabs not yet known are registered.
    pub fn apply_slot_matrix(&mut self, rows: &[SlotMatrixRow]) {
        for row in rows {
            if let Some(by_slab) = self.slot_fees.get_mut(&row.duration) {
                by_slab.remove(&row.slab);
            }
            if let Some(by_slab) = self.slot_distribution.get_mut(&row.duration) {
                by_slab.remove(&row.slab);
            }
        }

        for row in rows {
            if !self.durations.contains(&row.duration) {
                self.durations.push(row.duration);
            }
            let slabs = self.slab_amounts.entry(row.duration).or_default();
            if !slabs.contains(&row.slab) {
                slabs.push(row.slab);
            }

            let fee = SlotFee {
                fee_pct: row.fee_pct,
                blocked: row.blocked,
            };
            self.set_slot(row.duration, row.slab, row.slot, fee, row.distribution_pct);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validate;

    const MATRIX: &str = "\
duration,slab,slot,fee_pct,blocked,distribution_pct
3,1000,1,2.0,false,50
3,1000,2,1.5,false,50
3,1000,3,0,true,0
6,5000,1,4.0,false,100
";

    #[test]
    fn test_load_slot_matrix_from_reader() {
        let rows = load_slot_matrix_from_reader(MATRIX.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].slot, 3);
        assert!(rows[2].blocked);
        assert_eq!(rows[3].slab, 5000);
    }

    #[test]
    fn test_apply_slot_matrix_replaces_slots() {
        let rows = load_slot_matrix_from_reader(MATRIX.as_bytes()).unwrap();
        let mut product = ProductConfig::empty();
        product.durations.push(3);
        product.slab_amounts.insert(3, vec![1000]);
        product.set_slot(3, 1000, 1, SlotFee::open(9.0), 100.0);

        product.apply_slot_matrix(&rows);

        assert_eq!(product.durations, vec![3, 6]);
        assert_eq!(product.slabs_for(6), &[5000]);
        assert_eq!(product.slot_fee(3, 1000, 1), Some(SlotFee::open(2.0)));
        assert_eq!(product.slot_fee(3, 1000, 3), Some(SlotFee::blocked()));
        assert_eq!(product.slot_shares(3, 1000), vec![(1, 50.0), (2, 50.0)]);

        let config = ForecastConfig {
            product,
            ..Default::default()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bad_matrix_row_is_an_error() {
        let bad = "duration,slab,slot,fee_pct,blocked,distribution_pct\n3,abc,1,2.0,false,100\n";
        assert!(matches!(
            load_slot_matrix_from_reader(bad.as_bytes()),
            Err(ForecastError::Csv(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = ForecastConfig::from_json_path(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ForecastError::Io { .. }));
    }

    #[test]
    fn test_from_json_str() {
        let config = ForecastConfig::from_json_str(r#"{ "lifecycle": { "starting_users": 42 } }"#).unwrap();
        assert_eq!(config.lifecycle.starting_users, 42);
        assert!(ForecastConfig::from_json_str("{ not json").is_err());
    }
}
