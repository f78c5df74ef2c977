//! Top-level facade crate for tally.
//!
//! Re-exports the metric taxonomy and the exporter library so host
//! applications can depend on a single crate.

pub mod core {
    pub use tally_core::*;
}

pub mod exporter {
    pub use tally_exporter::*;
}
