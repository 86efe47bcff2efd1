//! # Hydronet
//!
//! Aquatic connectivity analysis for river networks derived from the
//! **NHDPlus High Resolution** dataset. Hydronet ingests per-basin flowline
//! exports, stitches them into one region graph, snaps barriers (dams,
//! waterfalls, road crossings) onto the network, cuts flowlines at the
//! snapped positions, and assembles the *functional networks*: the
//! stretches of river an aquatic organism can reach without passing a
//! barrier, together with per-network metrics.
//!
//! ## Pipeline
//!
//! ```text
//! basin exports ─▶ merge ─▶ snap ─▶ cut ─▶ networks ─▶ statistics
//! ```
//!
//! Everything runs single-threaded and in-memory for one region; the
//! stages are deterministic (all tie-breaks resolve by ascending id), so a
//! re-run over identical inputs reproduces every output bit for bit.
//!
//! ## Quick start
//!
//! ```
//! use hydronet::ingest::BarrierRecord;
//! use hydronet::{
//!     BarrierInput, BarrierKind, BasinInput, Config, FlowlineRecord, JoinRecord, Pipeline,
//!     RegionInput, SizeClass,
//! };
//!
//! # fn main() -> hydronet::Result<()> {
//! // One flowline from (0,0) to (100,0), one dam at its midpoint.
//! let basin = BasinInput {
//!     crs: "ESRI:102003".into(),
//!     flowlines: vec![FlowlineRecord {
//!         id: 1,
//!         geometry: vec![(0.0, 0.0), (100.0, 0.0)],
//!         huc4: "0101".into(),
//!         gnis_name: None,
//!         size_class: SizeClass::Headwater,
//!         is_loop: false,
//!         perennial: true,
//!     }],
//!     joins: vec![JoinRecord { upstream: 0, downstream: 1 }],
//! };
//! let barriers = BarrierInput {
//!     crs: "ESRI:102003".into(),
//!     records: vec![BarrierRecord {
//!         id: 10,
//!         kind: BarrierKind::Dam,
//!         x: 50.0,
//!         y: 0.0,
//!         gnis_name: None,
//!         attributes: Default::default(),
//!     }],
//! };
//!
//! let outputs = Pipeline::new(Config::default()).run(RegionInput {
//!     basins: vec![basin],
//!     barriers,
//!     floodplain: Default::default(),
//! })?;
//!
//! // The dam cut the flowline in two, one functional network each.
//! assert_eq!(outputs.store.len(), 2);
//! assert_eq!(outputs.networks.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module overview
//!
//! - [`geom`] - planar points, envelopes, polylines, linear referencing
//! - [`flowline`] / [`store`] - flowline records and the spatially indexed
//!   store
//! - [`joins`] - the bidirectional join multimap with sentinel semantics
//! - [`ingest`] / [`merge`] - reader-shaped inputs, validation, basin
//!   merging with border reconciliation
//! - [`snap`] / [`names`] - barrier snapping and its QA heuristics
//! - [`cut`] - flowline splitting, id minting, join rewiring
//! - [`network`] - functional network assembly
//! - [`stats`] - per-network aggregation and the floodplain join
//! - [`pipeline`] - the end-to-end driver
//! - [`io`] - WKB geometry plus Parquet/CSV table IO (feature-gated)
//! - [`diagnostics`] - the non-fatal findings channel
//! - [`testing`] - fixture builders for the test suite
//!
//! ## Feature flags
//!
//! - `io-parquet` - Parquet table IO for flowlines, barriers, and network
//!   statistics (requires Arrow)
//! - `io-csv` - CSV reader for the per-catchment floodplain table
//! - `parallel-stats` - aggregate disjoint networks on a Rayon pool

pub mod barrier;
pub mod config;
pub mod cut;
pub mod diagnostics;
pub mod error;
pub mod flowline;
pub mod geom;
pub mod ingest;
pub mod io;
pub mod joins;
pub mod merge;
pub mod names;
pub mod network;
pub mod pipeline;
pub mod snap;
pub mod stats;
pub mod store;
pub mod testing;

// General re-exports
pub use barrier::{Barrier, BarrierId, BarrierKind, NameMatch, Snap, SnappedBarrier};
pub use config::Config;
pub use cut::{BarrierSpan, CutOutcome, IdMinter, cut_at_barriers};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{Error, Result};
pub use flowline::{Flowline, FlowlineId, SizeClass};
pub use geom::{Envelope, Point, Polyline};
pub use ingest::{BarrierInput, BasinInput, FlowlineRecord, JoinRecord, ingest_basin};
pub use joins::JoinTable;
pub use merge::merge_regions;
pub use network::{FunctionalNetwork, NetworkAssignment, build_networks};
pub use pipeline::{AnalysisOutputs, BarrierNetworkRow, Pipeline, RegionInput};
pub use snap::{snap_barriers, snap_one};
pub use stats::{FloodplainRow, FloodplainTable, NetworkStats, summarize_networks};
pub use store::FlowlineStore;

// Gated re-exports
#[cfg(feature = "io-parquet")]
pub use io::parquet::{read_flowlines, write_flowlines};

#[cfg(feature = "io-csv")]
pub use io::csv::read_floodplain_csv;
