//! # Diagnostics
//!
//! Read-only queries against a live engine (energy, angular momentum, osculating
//! elements of every body) and post-run summaries of the persisted conservation tables.
use std::{collections::HashMap, fs::File};

use arrow_array::Float64Array;
use arrow_schema::DataType;
use camino::Utf8Path;
use itertools::izip;
use nalgebra::Vector3;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::{
    engine::PhysicsEngine,
    flyby_errors::{FlybyError, Result},
    orbit_type::osculating_element::{state_to_elements, OsculatingElements},
};

/// Pass-through conserved-quantity queries on a live engine.
///
/// Nothing is cached: every call reflects the engine state at call time.
pub struct Diagnostics<'a, E: PhysicsEngine + ?Sized> {
    engine: &'a E,
}

impl<'a, E: PhysicsEngine + ?Sized> Diagnostics<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Diagnostics { engine }
    }

    pub fn energy(&self) -> f64 {
        self.engine.energy()
    }

    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.engine.angular_momentum()
    }
}

/// Osculating elements of one body relative to the central body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyElements {
    /// Position of the body in the engine particle list
    pub index: usize,
    pub name: String,
    pub elements: OsculatingElements,
}

/// Osculating elements of every non-central particle.
///
/// Each body is treated as a two-body problem with the central particle:
/// relative position and velocity, `μ = G·(m_central + m_body)`.
///
/// Arguments
/// ---------
/// * `engine`: live engine.
/// * `names`: body names in particle order. Particles without a name are labelled `body{index}`.
/// * `central_index`: index of the central particle (0 for the Sun).
///
/// Errors
/// ------
/// * [`FlybyError::CentralIndexOutOfRange`] if `central_index` is not a particle.
/// * [`FlybyError::DegenerateOrbit`] if a body coincides with the central particle.
pub fn compute_elements<E: PhysicsEngine + ?Sized>(
    engine: &E,
    names: &[String],
    central_index: usize,
) -> Result<Vec<BodyElements>> {
    let particles = engine.particles();
    let central = particles
        .get(central_index)
        .ok_or(FlybyError::CentralIndexOutOfRange {
            index: central_index,
            len: particles.len(),
        })?;
    let g = engine.gravitational_constant();

    particles
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != central_index)
        .map(|(j, p)| {
            let mu = g * (central.mass + p.mass);
            let elements = state_to_elements(
                &(p.position - central.position),
                &(p.velocity - central.velocity),
                mu,
            )?;
            Ok(BodyElements {
                index: j,
                name: names.get(j).cloned().unwrap_or_else(|| format!("body{j}")),
                elements,
            })
        })
        .collect()
}

/// Conserved quantities captured at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationBaseline {
    pub energy: f64,
    pub angular_momentum: Vector3<f64>,
}

/// Relative drift of the conserved quantities with respect to a baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationDrift {
    /// `(E − E₀) / |E₀|`
    pub relative_energy: f64,
    /// `(|L| − |L₀|) / |L₀|`
    pub relative_angular_momentum: f64,
}

fn relative(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        value - reference
    } else {
        (value - reference) / reference.abs()
    }
}

impl ConservationBaseline {
    pub fn capture<E: PhysicsEngine + ?Sized>(engine: &E) -> Self {
        ConservationBaseline {
            energy: engine.energy(),
            angular_momentum: engine.angular_momentum(),
        }
    }

    pub fn drift<E: PhysicsEngine + ?Sized>(&self, engine: &E) -> ConservationDrift {
        ConservationDrift {
            relative_energy: relative(engine.energy(), self.energy),
            relative_angular_momentum: relative(
                engine.angular_momentum().norm(),
                self.angular_momentum.norm(),
            ),
        }
    }
}

/// Conservation series rebuilt from the persisted `energy` and `angmom` tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationSummary {
    /// Sampling times of the energy table
    pub energy_time: Vec<f64>,
    /// `(E − E₀) / |E₀|`
    pub fractional_energy: Vec<f64>,
    /// Sampling times of the angular momentum table
    pub angular_momentum_time: Vec<f64>,
    /// `|L|`
    pub angular_momentum_norm: Vec<f64>,
    /// `(|L| − |L₀|) / |L₀|`
    pub fractional_angular_momentum: Vec<f64>,
    pub max_abs_fractional_energy: f64,
    pub max_abs_fractional_angular_momentum: f64,
}

type Table = HashMap<String, Vec<f64>>;

fn read_parquet_table(path: &Utf8Path) -> Result<Table> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;

    let mut table = Table::new();
    for batch in reader {
        let batch = batch?;
        for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
            if field.data_type() != &DataType::Float64 {
                continue;
            }
            if let Some(values) = column.as_any().downcast_ref::<Float64Array>() {
                table
                    .entry(field.name().clone())
                    .or_default()
                    .extend(values.iter().map(|v| v.unwrap_or(f64::NAN)));
            }
        }
    }
    Ok(table)
}

/// Numeric columns of a CSV table; columns with a non-numeric cell are skipped.
fn read_csv_table(path: &Utf8Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut columns: Vec<Option<Vec<f64>>> = vec![Some(Vec::new()); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            let parsed = cell.trim().parse::<f64>();
            match (column.as_mut(), parsed) {
                (Some(values), Ok(v)) => values.push(v),
                (Some(_), Err(_)) => *column = None,
                (None, _) => {}
            }
        }
    }

    Ok(headers
        .iter()
        .zip(columns)
        .filter_map(|(name, values)| values.map(|v| (name.to_string(), v)))
        .collect())
}

/// Load `<stem>.parquet`, or `<stem>.csv` if no Parquet file exists.
fn load_table(outdir: &Utf8Path, stem: &str) -> Result<Table> {
    let parquet = outdir.join(format!("{stem}.parquet"));
    if parquet.exists() {
        return read_parquet_table(&parquet);
    }
    let csv_path = outdir.join(format!("{stem}.csv"));
    if csv_path.exists() {
        return read_csv_table(&csv_path);
    }
    Err(FlybyError::MissingTable {
        stem: stem.to_string(),
        dir: outdir.to_string(),
    })
}

fn column<'t>(table: &'t Table, stem: &str, candidates: &[&str]) -> Result<&'t [f64]> {
    candidates
        .iter()
        .find_map(|name| table.get(*name))
        .map(Vec::as_slice)
        .ok_or_else(|| FlybyError::MissingColumn {
            stem: stem.to_string(),
            column: candidates.join("/"),
        })
}

fn fractional(series: &[f64]) -> Vec<f64> {
    match series.first() {
        Some(&first) => series.iter().map(|v| relative(*v, first)).collect(),
        None => Vec::new(),
    }
}

fn max_abs(series: &[f64]) -> f64 {
    series.iter().map(|v| v.abs()).fold(0.0, f64::max)
}

/// Summarize energy and angular momentum conservation of a finished run.
///
/// Reads `energy` (`t`/`time`, `E`/`total_energy`) and `angmom`
/// (`t`/`time`, `Lx`, `Ly`, `Lz`) from `outdir`, Parquet first, CSV otherwise.
///
/// Errors
/// ------
/// * [`FlybyError::MissingTable`] if a table is found in neither format.
/// * [`FlybyError::MissingColumn`] if a required column is absent.
pub fn summarize_conservation(outdir: &Utf8Path) -> Result<ConservationSummary> {
    let energy = load_table(outdir, "energy")?;
    let energy_time = column(&energy, "energy", &["t", "time"])?.to_vec();
    let fractional_energy = fractional(column(&energy, "energy", &["E", "total_energy"])?);

    let angmom = load_table(outdir, "angmom")?;
    let angular_momentum_time = column(&angmom, "angmom", &["t", "time"])?.to_vec();
    let angular_momentum_norm: Vec<f64> = izip!(
        column(&angmom, "angmom", &["Lx"])?,
        column(&angmom, "angmom", &["Ly"])?,
        column(&angmom, "angmom", &["Lz"])?
    )
    .map(|(x, y, z)| Vector3::new(*x, *y, *z).norm())
    .collect();
    let fractional_angular_momentum = fractional(&angular_momentum_norm);

    Ok(ConservationSummary {
        max_abs_fractional_energy: max_abs(&fractional_energy),
        max_abs_fractional_angular_momentum: max_abs(&fractional_angular_momentum),
        energy_time,
        fractional_energy,
        angular_momentum_time,
        angular_momentum_norm,
        fractional_angular_momentum,
    })
}
