//! Factory functions for assembling the pipeline
//!
//! This module is the composition root: concrete collaborators are built from
//! configuration here and handed to the pipeline as trait objects.

mod pipeline;

pub use pipeline::{create_dedup_store, create_dispatcher, create_pipeline};
