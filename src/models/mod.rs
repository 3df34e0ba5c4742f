pub mod de;
pub mod job;
pub mod qa;
pub mod user;

pub use job::{Job, JobId, JobPayload, JobStatus, StatusReport, StatusResponse};
pub use qa::{Answer, JobResult, QaPair, Question};
pub use user::{AudioFile, Session, UserId};
