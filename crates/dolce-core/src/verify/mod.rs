//! Two-phase verification: static validators, then one batched oracle call.

pub mod json_extract;
pub mod mapper;
pub mod orchestrator;
pub mod prompts;

pub use json_extract::extract_embedded_object;
pub use mapper::map_oracle_reply;
pub use orchestrator::{VerifyStats, Verifier};
