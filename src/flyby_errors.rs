use thiserror::Error;

use crate::engine::ForceModel;

#[derive(Error, Debug)]
pub enum FlybyError {
    #[error("Position magnitude ~ 0 ({position_norm:e} AU); cannot compute orbital elements")]
    DegenerateOrbit { position_norm: f64 },

    #[error("Catalogue {path} is missing required columns: {}", missing.join(", "))]
    Schema { path: String, missing: Vec<String> },

    #[error("Body {body} is present but its primary {primary} is absent from the catalogue")]
    MissingPrimary { body: String, primary: String },

    #[error("Catalogue row {body} cannot be placed on an elliptic orbit: {reason}")]
    InvalidCatalogRow { body: String, reason: String },

    #[error("Optional force {0} is not available in this engine")]
    OptionalForceUnavailable(ForceModel),

    #[error("Universal Kepler drift failed to converge for a step of {dt:e} yr")]
    KeplerDriftFailed { dt: f64 },

    #[error("Central index {index} out of range for {len} particles")]
    CentralIndexOutOfRange { index: usize, len: usize },

    #[error("Missing {stem}.parquet/csv in {dir}")]
    MissingTable { stem: String, dir: String },

    #[error("Table {stem} has no usable column for {column}")]
    MissingColumn { stem: String, column: String },

    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to parse the run configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),
}

pub type Result<T> = std::result::Result<T, FlybyError>;

impl PartialEq for FlybyError {
    fn eq(&self, other: &Self) -> bool {
        use FlybyError::*;
        match (self, other) {
            (DegenerateOrbit { position_norm: a }, DegenerateOrbit { position_norm: b }) => a == b,
            (Schema { path: p1, missing: m1 }, Schema { path: p2, missing: m2 }) => {
                p1 == p2 && m1 == m2
            }
            (
                MissingPrimary { body: b1, primary: p1 },
                MissingPrimary { body: b2, primary: p2 },
            ) => b1 == b2 && p1 == p2,
            (
                InvalidCatalogRow { body: b1, reason: r1 },
                InvalidCatalogRow { body: b2, reason: r2 },
            ) => b1 == b2 && r1 == r2,
            (OptionalForceUnavailable(a), OptionalForceUnavailable(b)) => a == b,
            (KeplerDriftFailed { dt: a }, KeplerDriftFailed { dt: b }) => a == b,
            (
                CentralIndexOutOfRange { index: i1, len: l1 },
                CentralIndexOutOfRange { index: i2, len: l2 },
            ) => i1 == i2 && l1 == l2,
            (MissingTable { stem: s1, dir: d1 }, MissingTable { stem: s2, dir: d2 }) => {
                s1 == s2 && d1 == d2
            }
            (MissingColumn { stem: s1, column: c1 }, MissingColumn { stem: s2, column: c2 }) => {
                s1 == s2 && c1 == c2
            }
            (InvalidConfig(a), InvalidConfig(b)) => a == b,

            // wrapped errors are not comparable: same variant is enough
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ParquetError(_), ParquetError(_)) => true,
            (ArrowError(_), ArrowError(_)) => true,

            _ => false,
        }
    }
}
