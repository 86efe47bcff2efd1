//! Parquet persistence for analysis tables.
//!
//! Two shapes of table IO:
//! - **Typed scalar rows** powered by Serde + Arrow + Parquet:
//!   [`write_rows`]/[`read_rows`] plus the concrete barrier and
//!   network-statistics row types.
//! - **The flowline table** with an explicit Arrow schema, because its
//!   geometry column is WKB bytes that Serde tracing cannot infer:
//!   [`write_flowlines`]/[`read_flowlines`].
//!
//! All writers use ZSTD column compression; Parquet embeds the schema, so
//! the files are self-describing.

use crate::flowline::{Flowline, FlowlineId, SizeClass};
use crate::geom::Polyline;
use crate::io::wkb;
use crate::network::NetworkAssignment;
use crate::pipeline::BarrierNetworkRow;
use crate::stats::NetworkStats;
use crate::store::FlowlineStore;
use anyhow::{Context, Result, anyhow};
use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float64Array, StringArray, UInt8Array,
    UInt64Array,
};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use serde_arrow::{from_record_batch, to_record_batch};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build()
}

/// Write a typed `Vec<T>` of scalar rows to a Parquet file.
///
/// The Arrow schema is inferred from `T` with `SchemaLike::from_type`, so
/// this works even when `rows` is empty (a zero-row batch is written).
///
/// # Errors
/// An error is returned if schema inference, conversion, file creation, or
/// writing fails.
pub fn write_rows<T: Serialize + Deserialize<'static>>(
    path: impl AsRef<Path>,
    rows: &Vec<T>,
) -> Result<usize> {
    let path = path.as_ref();
    let fields: Vec<FieldRef> = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())
        .context("infer Arrow schema from row type")?;
    let batch: RecordBatch =
        to_record_batch(&fields, rows).context("convert rows to RecordBatch")?;

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties()))
        .context("create ArrowWriter")?;
    writer.write(&batch).context("write batch to parquet")?;
    writer.close().context("close ArrowWriter")?;
    Ok(rows.len())
}

/// Read a Parquet file of scalar rows back into a typed `Vec<T>`.
///
/// # Errors
/// Returns an error if the file cannot be opened, the reader cannot be
/// built, batch iteration fails, or conversion to `T` fails.
pub fn read_rows<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("open ParquetRecordBatchReader")?;
    let mut reader = builder.build().context("build ParquetRecordBatchReader")?;

    let mut out: Vec<T> = Vec::new();
    while let Some(batch) = reader.next().transpose().context("read next batch")? {
        let mut rows: Vec<T> =
            from_record_batch(&batch).context("deserialize RecordBatch rows")?;
        out.append(&mut rows);
    }
    Ok(out)
}

/* ===================== barrier table ===================== */

/// On-disk row of the barrier-to-network table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarrierTableRow {
    pub barrier_id: u64,
    pub upstream_network_id: Option<u64>,
    pub downstream_network_id: Option<u64>,
    pub snap_dist: f64,
    pub candidates_within_100m: u32,
    pub name_match: String,
    pub at_endpoint: bool,
}

impl From<&BarrierNetworkRow> for BarrierTableRow {
    fn from(row: &BarrierNetworkRow) -> Self {
        Self {
            barrier_id: row.barrier.raw(),
            upstream_network_id: row.upstream_network.map(|id| id.raw()),
            downstream_network_id: row.downstream_network.map(|id| id.raw()),
            snap_dist: row.snap_dist,
            candidates_within_100m: row.candidates_within_100m,
            name_match: row.name_match.as_str().to_string(),
            at_endpoint: row.at_endpoint,
        }
    }
}

/// Write the barrier-to-network table.
pub fn write_barrier_table(
    path: impl AsRef<Path>,
    rows: &[BarrierNetworkRow],
) -> Result<usize> {
    write_rows(path, &rows.iter().map(BarrierTableRow::from).collect::<Vec<_>>())
}

/// Read the barrier-to-network table.
pub fn read_barrier_table(path: impl AsRef<Path>) -> Result<Vec<BarrierTableRow>> {
    read_rows(path)
}

/* ===================== network statistics table ===================== */

/// On-disk row of the per-network statistics table. The size-class
/// histogram is flattened into one column per class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatsRow {
    pub network: u64,
    pub total_length_km: f64,
    pub perennial_length_km: f64,
    pub num_segments: u32,
    pub n_headwater: u32,
    pub n_small_creek: u32,
    pub n_creek: u32,
    pub n_small_river: u32,
    pub n_river: u32,
    pub n_large_river: u32,
    pub n_great_river: u32,
    pub sinuosity: f64,
    pub floodplain_natural_pct: Option<f64>,
}

impl From<&NetworkStats> for NetworkStatsRow {
    fn from(s: &NetworkStats) -> Self {
        let c = &s.size_class_counts;
        Self {
            network: s.network.raw(),
            total_length_km: s.total_length_km,
            perennial_length_km: s.perennial_length_km,
            num_segments: s.num_segments,
            n_headwater: c[0],
            n_small_creek: c[1],
            n_creek: c[2],
            n_small_river: c[3],
            n_river: c[4],
            n_large_river: c[5],
            n_great_river: c[6],
            sinuosity: s.sinuosity,
            floodplain_natural_pct: s.floodplain_natural_pct,
        }
    }
}

/// Write the per-network statistics table.
pub fn write_network_stats(path: impl AsRef<Path>, stats: &[NetworkStats]) -> Result<usize> {
    write_rows(path, &stats.iter().map(NetworkStatsRow::from).collect::<Vec<_>>())
}

/// Read the per-network statistics table.
pub fn read_network_stats(path: impl AsRef<Path>) -> Result<Vec<NetworkStatsRow>> {
    read_rows(path)
}

/* ===================== flowline table ===================== */

fn flowline_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::UInt64, false),
        Field::new("geometry", DataType::Binary, false),
        Field::new("huc4", DataType::Utf8, false),
        Field::new("gnis_name", DataType::Utf8, true),
        Field::new("size_class", DataType::UInt8, false),
        Field::new("loop", DataType::Boolean, false),
        Field::new("perennial", DataType::Boolean, false),
        Field::new("length_m", DataType::Float64, false),
        Field::new("sinuosity", DataType::Float64, false),
        Field::new("network_id", DataType::UInt64, true),
    ])
}

/// Write the flowline store as one Parquet table, geometry as WKB.
///
/// When `assignment` is given, each row carries its functional network id;
/// otherwise the `network_id` column is all null.
///
/// # Errors
/// Returns an error if the batch cannot be assembled or the file cannot be
/// written.
pub fn write_flowlines(
    path: impl AsRef<Path>,
    store: &FlowlineStore,
    assignment: Option<&NetworkAssignment>,
) -> Result<usize> {
    let path = path.as_ref();

    let wkb_blobs: Vec<Vec<u8>> = store
        .iter()
        .map(|f| wkb::encode_linestring(&f.geometry))
        .collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(store.iter().map(|f| f.id.raw()))),
        Arc::new(BinaryArray::from_iter_values(wkb_blobs.iter())),
        Arc::new(StringArray::from_iter_values(store.iter().map(|f| f.huc4.as_str()))),
        Arc::new(StringArray::from_iter(store.iter().map(|f| f.gnis_name.as_deref()))),
        Arc::new(UInt8Array::from_iter_values(
            store.iter().map(|f| f.size_class.index() as u8),
        )),
        Arc::new(BooleanArray::from_iter(store.iter().map(|f| Some(f.is_loop)))),
        Arc::new(BooleanArray::from_iter(store.iter().map(|f| Some(f.perennial)))),
        Arc::new(Float64Array::from_iter_values(store.iter().map(|f| f.length))),
        Arc::new(Float64Array::from_iter_values(store.iter().map(|f| f.sinuosity))),
        Arc::new(UInt64Array::from_iter(store.iter().map(|f| {
            assignment
                .and_then(|a| a.network_of(f.id))
                .map(|id| id.raw())
        }))),
    ];
    let batch = RecordBatch::try_new(Arc::new(flowline_schema()), columns)
        .context("assemble flowline RecordBatch")?;

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties()))
        .context("create ArrowWriter")?;
    writer.write(&batch).context("write flowline batch")?;
    writer.close().context("close ArrowWriter")?;
    Ok(store.len())
}

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column {name}"))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| anyhow!("column {name} has an unexpected Arrow type"))
}

/// Read a flowline table back into a store plus its network assignments
/// (empty when the `network_id` column is all null).
///
/// Lengths and sinuosity are rederived from the decoded geometry, which
/// reproduces the written values bit for bit.
///
/// # Errors
/// Returns an error on missing/mistyped columns, malformed WKB, or rows
/// that fail flowline validation.
pub fn read_flowlines(
    path: impl AsRef<Path>,
) -> Result<(FlowlineStore, BTreeMap<FlowlineId, FlowlineId>)> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("open ParquetRecordBatchReader")?;
    let mut reader = builder.build().context("build ParquetRecordBatchReader")?;

    let mut store = FlowlineStore::new();
    let mut networks = BTreeMap::new();
    while let Some(batch) = reader.next().transpose().context("read next batch")? {
        let ids: &UInt64Array = column(&batch, "id")?;
        let geometries: &BinaryArray = column(&batch, "geometry")?;
        let huc4s: &StringArray = column(&batch, "huc4")?;
        let names: &StringArray = column(&batch, "gnis_name")?;
        let size_classes: &UInt8Array = column(&batch, "size_class")?;
        let loops: &BooleanArray = column(&batch, "loop")?;
        let perennials: &BooleanArray = column(&batch, "perennial")?;
        let network_ids: &UInt64Array = column(&batch, "network_id")?;

        for row in 0..batch.num_rows() {
            let id = FlowlineId::new(ids.value(row));
            let geometry: Polyline = wkb::decode_linestring(geometries.value(row))
                .with_context(|| format!("decode geometry of flowline {id}"))?;
            let size_class = SizeClass::from_index(size_classes.value(row))
                .ok_or_else(|| anyhow!("flowline {id} has an unknown size class"))?;
            let gnis_name =
                (!names.is_null(row)).then(|| names.value(row).to_string());
            let flowline = Flowline::new(
                id,
                geometry,
                huc4s.value(row),
                gnis_name,
                size_class,
                loops.value(row),
                perennials.value(row),
            )
            .with_context(|| format!("validate flowline {id}"))?;
            store
                .insert(flowline)
                .with_context(|| format!("insert flowline {id}"))?;
            if !network_ids.is_null(row) {
                networks.insert(id, FlowlineId::new(network_ids.value(row)));
            }
        }
    }
    Ok((store, networks))
}
