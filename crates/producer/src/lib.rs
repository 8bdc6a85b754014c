//! Synthetic event generation and the publishing loops.
//!
//! Everything here is an external collaborator of the pipeline: the
//! generator, the interactive prompt parser and the timed batch loop never
//! leak into the pipeline's own types.

pub mod generator;
pub mod input;
pub mod runner;

pub use generator::ClaimEventGenerator;
pub use input::{UserCommand, parse_user_command};
pub use runner::ProducerLoop;
