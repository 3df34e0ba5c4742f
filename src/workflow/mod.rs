pub mod job_poller;
pub mod poll_machine;

pub use job_poller::{JobPoller, PollProgress};
pub use poll_machine::{PollMachine, PollOutcome, Transition};
