//! On-disk interchange for analysis inputs and outputs.
//!
//! Geometry travels as well-known binary; tables travel as Parquet
//! (column-oriented, per-column compression, schema embedded). Reading the
//! vendor geodatabase and writing shapefiles are collaborator concerns and
//! live outside this crate.

pub mod wkb;

#[cfg(feature = "io-parquet")]
pub mod parquet;

#[cfg(feature = "io-csv")]
pub mod csv;
