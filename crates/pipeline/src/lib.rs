//! The fulfillment pipeline: durably consume orders, check and deduct
//! inventory, and republish each order onto the ship or reconciliation
//! topic.

pub mod outcome;
pub mod processor;

pub use outcome::{Destination, FulfillmentOutcome};
pub use processor::{FulfillmentPipeline, PipelineTopics};
