//! Data models for ReefPledge

mod submission;

pub use submission::{Submission, SubmissionId};
