//! # J2000 element catalogue reader
//!
//! The catalogue is a CSV file with a header line. One row per body:
//!
//! | column      | unit | meaning                          |
//! |-------------|------|----------------------------------|
//! | `name`      |      | body name                        |
//! | `a_AU`      | AU   | semi-major axis                  |
//! | `e`         |      | eccentricity                     |
//! | `i_deg`     | deg  | inclination                      |
//! | `Omega_deg` | deg  | longitude of the ascending node  |
//! | `omega_deg` | deg  | argument of periapsis            |
//! | `M_deg`     | deg  | mean anomaly                     |
//! | `m_Msun`    | Msun | mass                             |
//!
//! Extra columns are ignored and whitespace around fields is stripped. Satellite rows (the Moon) carry geocentric elements.
use camino::Utf8Path;

use crate::{
    constants::{Degree, SolarMass},
    flyby_errors::{FlybyError, Result},
};

/// Columns every catalogue must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "name",
    "a_AU",
    "e",
    "i_deg",
    "Omega_deg",
    "omega_deg",
    "M_deg",
    "m_Msun",
];

/// One catalogue row, angles still in degrees.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct CatalogRow {
    pub name: String,
    #[serde(rename = "a_AU")]
    pub semi_major_axis: f64,
    #[serde(rename = "e")]
    pub eccentricity: f64,
    #[serde(rename = "i_deg")]
    pub inclination: Degree,
    #[serde(rename = "Omega_deg")]
    pub ascending_node_longitude: Degree,
    #[serde(rename = "omega_deg")]
    pub periapsis_argument: Degree,
    #[serde(rename = "M_deg")]
    pub mean_anomaly: Degree,
    #[serde(rename = "m_Msun")]
    pub mass: SolarMass,
}

/// Read every row of a catalogue file.
///
/// The header is validated before any row is parsed: the load is all or nothing.
///
/// Errors
/// ------
/// * [`FlybyError::Schema`] listing every missing required column.
/// * [`FlybyError::CsvError`] for unreadable files or malformed rows.
pub fn load_catalog(path: &Utf8Path) -> Result<Vec<CatalogRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    check_header(path, reader.headers()?)?;

    reader
        .deserialize::<CatalogRow>()
        .map(|row| row.map_err(FlybyError::from))
        .collect()
}

fn check_header(path: &Utf8Path, header: &csv::StringRecord) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !header.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FlybyError::Schema {
            path: path.to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod catalog_reader_test {
    use super::*;
    use camino::Utf8PathBuf;
    use std::io::Write;

    fn write_catalog(content: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("elements.csv")).unwrap();
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_catalog() {
        let (_dir, path) = write_catalog(
            "name,a_AU,e,i_deg,Omega_deg,omega_deg,M_deg,m_Msun,source\n\
             Sun,0,0,0,0,0,0,1.0,horizons\n\
             Mars,1.5237,0.0934,1.85,49.56,286.5,19.39,3.227e-7,horizons\n",
        );

        let rows = load_catalog(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "Mars");
        assert_eq!(rows[1].semi_major_axis, 1.5237);
        assert_eq!(rows[1].ascending_node_longitude, 49.56);
        assert_eq!(rows[1].mass, 3.227e-7);
    }

    #[test]
    fn test_missing_columns() {
        let (_dir, path) = write_catalog("name,a_AU,e,i_deg,M_deg\nMars,1.5,0.09,1.8,19.4\n");

        assert_eq!(
            load_catalog(&path),
            Err(FlybyError::Schema {
                path: path.to_string(),
                missing: vec![
                    "Omega_deg".to_string(),
                    "omega_deg".to_string(),
                    "m_Msun".to_string()
                ],
            })
        );
    }

    #[test]
    fn test_padded_header_and_fields() {
        let (_dir, path) = write_catalog(
            "name, a_AU, e, i_deg, Omega_deg, omega_deg, M_deg, m_Msun\n\
             Mars, 1.5237, 0.0934, 1.85, 49.56, 286.5, 19.39, 3.227e-7\n",
        );

        let rows = load_catalog(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Mars");
        assert_eq!(rows[0].semi_major_axis, 1.5237);
        assert_eq!(rows[0].mass, 3.227e-7);
    }

    #[test]
    fn test_malformed_row() {
        let (_dir, path) = write_catalog(
            "name,a_AU,e,i_deg,Omega_deg,omega_deg,M_deg,m_Msun\nMars,far,0.09,1.8,49,286,19,3e-7\n",
        );
        assert!(matches!(load_catalog(&path), Err(FlybyError::CsvError(_))));
    }
}
