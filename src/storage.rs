//! # Snapshot recorder
//!
//! Buffers sampled diagnostics in memory during a run and persists them once at the end.
//!
//! Artifacts written by [`SnapshotRecorder::finalize`] in the output directory:
//!
//! | file               | columns                                                    |
//! |--------------------|------------------------------------------------------------|
//! | `elements.parquet` | `t, index, name, a, e, i, Omega, omega, M, n, P, varpi, f` |
//! | `energy.csv`       | `t, E`                                                     |
//! | `angmom.csv`       | `t, Lx, Ly, Lz`                                            |
//!
//! If the Parquet encoding of the element table fails, the same table is written to
//! `elements.csv` instead and a warning is emitted. No element file is produced when
//! no element row was recorded.
use std::{fs::File, sync::Arc};

use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use camino::{Utf8Path, Utf8PathBuf};
use nalgebra::Vector3;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use crate::{diagnostics::BodyElements, flyby_errors::Result};

/// One element row: the osculating elements of one body at one sampling instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRecord {
    pub t: f64,
    pub index: u32,
    pub name: String,
    pub a: f64,
    pub e: f64,
    pub i: f64,
    #[serde(rename = "Omega")]
    pub node: f64,
    pub omega: f64,
    #[serde(rename = "M")]
    pub mean_anomaly: f64,
    pub n: f64,
    #[serde(rename = "P")]
    pub period: f64,
    pub varpi: f64,
    pub f: f64,
}

impl ElementRecord {
    fn new(t: f64, body: &BodyElements) -> Self {
        let el = &body.elements;
        ElementRecord {
            t,
            index: body.index as u32,
            name: body.name.clone(),
            a: el.semi_major_axis,
            e: el.eccentricity,
            i: el.inclination,
            node: el.ascending_node_longitude,
            omega: el.periapsis_argument,
            mean_anomaly: el.mean_anomaly,
            n: el.mean_motion,
            period: el.period,
            varpi: el.periapsis_longitude,
            f: el.true_anomaly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct EnergyRecord {
    t: f64,
    #[serde(rename = "E")]
    energy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct AngularMomentumRecord {
    t: f64,
    #[serde(rename = "Lx")]
    lx: f64,
    #[serde(rename = "Ly")]
    ly: f64,
    #[serde(rename = "Lz")]
    lz: f64,
}

/// Paths of the artifacts produced by [`SnapshotRecorder::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFiles {
    /// `elements.parquet`, `elements.csv` after a fallback, or `None` when empty.
    pub elements: Option<Utf8PathBuf>,
    pub energy: Utf8PathBuf,
    pub angular_momentum: Utf8PathBuf,
}

/// Append-only in-memory buffers plus the output directory they are flushed to.
#[derive(Debug)]
pub struct SnapshotRecorder {
    outdir: Utf8PathBuf,
    elements: Vec<ElementRecord>,
    energy: Vec<EnergyRecord>,
    angular_momentum: Vec<AngularMomentumRecord>,
}

impl SnapshotRecorder {
    /// Create a recorder, creating `outdir` (and its parents) if needed.
    pub fn new(outdir: &Utf8Path) -> Result<Self> {
        std::fs::create_dir_all(outdir)?;
        Ok(SnapshotRecorder {
            outdir: outdir.to_owned(),
            elements: Vec::new(),
            energy: Vec::new(),
            angular_momentum: Vec::new(),
        })
    }

    pub fn outdir(&self) -> &Utf8Path {
        &self.outdir
    }

    /// Buffered element rows.
    pub fn element_records(&self) -> &[ElementRecord] {
        &self.elements
    }

    /// Number of recorded snapshots.
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Append one snapshot: an element row per body, one energy row and one angular
    /// momentum row, all tagged with `t`. No I/O happens here.
    pub fn record_snapshot(
        &mut self,
        t: f64,
        elements: &[BodyElements],
        energy: f64,
        angular_momentum: &Vector3<f64>,
    ) {
        self.elements
            .extend(elements.iter().map(|body| ElementRecord::new(t, body)));
        self.energy.push(EnergyRecord { t, energy });
        self.angular_momentum.push(AngularMomentumRecord {
            t,
            lx: angular_momentum.x,
            ly: angular_momentum.y,
            lz: angular_momentum.z,
        });
    }

    /// Write every buffered table to disk.
    ///
    /// Buffers are kept: calling it again rewrites the same files with the same content.
    pub fn finalize(&self) -> Result<RecordedFiles> {
        let elements = if self.elements.is_empty() {
            None
        } else {
            let parquet_path = self.outdir.join("elements.parquet");
            match write_elements_parquet(&parquet_path, &self.elements) {
                Ok(()) => Some(parquet_path),
                Err(err) => {
                    tracing::warn!("Parquet output failed ({err}), writing elements as CSV");
                    let csv_path = self.outdir.join("elements.csv");
                    write_csv(&csv_path, &self.elements)?;
                    Some(csv_path)
                }
            }
        };

        let energy = self.outdir.join("energy.csv");
        write_csv(&energy, &self.energy)?;

        let angular_momentum = self.outdir.join("angmom.csv");
        write_csv(&angular_momentum, &self.angular_momentum)?;

        tracing::debug!(
            "Flushed {} element rows and {} snapshots to {}",
            self.elements.len(),
            self.energy.len(),
            self.outdir
        );

        Ok(RecordedFiles {
            elements,
            energy,
            angular_momentum,
        })
    }
}

fn write_csv<T: Serialize>(path: &Utf8Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn elements_schema() -> Schema {
    let float_columns = ["a", "e", "i", "Omega", "omega", "M", "n", "P", "varpi", "f"];

    let mut fields = vec![
        Field::new("t", DataType::Float64, false),
        Field::new("index", DataType::UInt32, false),
        Field::new("name", DataType::Utf8, false),
    ];
    fields.extend(
        float_columns
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false)),
    );
    Schema::new(fields)
}

fn float_column(rows: &[ElementRecord], get: impl Fn(&ElementRecord) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(rows.iter().map(get)))
}

fn write_elements_parquet(path: &Utf8Path, rows: &[ElementRecord]) -> Result<()> {
    let schema = Arc::new(elements_schema());

    let columns: Vec<ArrayRef> = vec![
        float_column(rows, |r| r.t),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.index))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.name.as_str()))),
        float_column(rows, |r| r.a),
        float_column(rows, |r| r.e),
        float_column(rows, |r| r.i),
        float_column(rows, |r| r.node),
        float_column(rows, |r| r.omega),
        float_column(rows, |r| r.mean_anomaly),
        float_column(rows, |r| r.n),
        float_column(rows, |r| r.period),
        float_column(rows, |r| r.varpi),
        float_column(rows, |r| r.f),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
