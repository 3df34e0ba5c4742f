pub mod correlator;
pub mod history_sync;
pub mod session_holder;

pub use correlator::correlate;
pub use history_sync::HistorySync;
pub use session_holder::{AuthForm, SessionHolder};
