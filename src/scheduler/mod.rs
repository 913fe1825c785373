pub mod send;
pub mod state;

pub use send::SendScheduler;
pub use state::{ChannelState, SchedulerConfig, SchedulerSnapshot, SendError, SendState, SessionState};
