//! Export lifecycle event infrastructure.
//!
//! - [`ExportEventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ExportJobEvent`] -- one lifecycle event addressed to a job id.
//! - [`Reconciler`] -- background service mirroring lifecycle events onto
//!   the durable `csv_exports` registry.

pub mod bus;
pub mod reconciler;

pub use bus::{ExportEventBus, ExportJobEvent};
pub use reconciler::{ExportRegistry, PgExportRegistry, Reconciler};
