//! Service layer: the ingestion pipeline and the connection manager that
//! feeds it.

pub mod manager;
pub mod pipeline;

pub use manager::ChannelConnectionManager;
pub use pipeline::{PipelineOutcome, StreamPipeline};
