//! Synthetic event generation and model-applier aggregation for the
//! virtual people measurement pipeline.
//!
//! Generation: `EventsGenerator` builds its identifier pools once, then
//! composes one `LabelerInput` per call from the pools and its stream.
//! Aggregation: `apply_labeler` runs a `Labeler` over the inputs and
//! `aggregate_output` reduces the labeled outputs into a report.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod generator;
pub mod geo;
pub mod labeler;
pub mod pool;
pub mod profile;
pub mod rng;
pub mod seeded;
pub mod store;
pub mod types;

pub use aggregate::{aggregate_output, apply_labeler, AggregatedReport, ReportRow};
pub use config::{EventOptions, GeneratorConfig, RunConfig};
pub use error::{GenError, GenResult};
pub use event::{LabelerInput, LabelerInputList, PublisherEventId};
pub use generator::EventsGenerator;
pub use labeler::{Labeler, LabelerOutput, LabelerOutputList, PersonLabelAttributes, ProfileLabeler};
