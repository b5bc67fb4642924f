//! Render server API surface used by the client

pub mod types;

pub use types::{GenerateRequestBody, JobSnapshot, SubmitResponse};
