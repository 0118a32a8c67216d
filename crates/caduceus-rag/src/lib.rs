//! Retrieval-augmented clinical recommendation pipeline.
//!
//! Wires the collaborators together: literature source, embedder, vector
//! index, and the pure clinical stages. Construction is fallible; query
//! processing always terminates in a well-formed response.

pub mod pipeline;
pub mod progress;
pub mod retrieve;

pub use pipeline::{Pipeline, PipelineError};
pub use progress::{NoProgress, ProgressSink, Stage};
