//! Despiking of multi-rate CTE (coefficient of thermal expansion) spreadsheets.
//!
//! The library holds the whole data pipeline; the `cte-despike` binary is a
//! thin egui front-end over [`state::Session`].

pub mod config;
pub mod data;
pub mod state;

pub use config::DespikeConfig;
pub use data::error::{ExportError, TableError};
pub use data::model::{Column, ColumnKey, Field, HeatingRate, WideTable};
pub use state::Session;
