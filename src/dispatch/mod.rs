//! Command dispatch — sequential delivery of transcripts to the agent.
//!
//! [`CommandProcessor`] is the black-box downstream collaborator: async,
//! text in, result out, may do network I/O.  [`DispatchLoop`] is the single
//! cooperative task that feeds it one result at a time.

pub mod processor;
pub mod runner;

pub use processor::{AgentClient, CommandError, CommandProcessor};
pub use runner::DispatchLoop;
