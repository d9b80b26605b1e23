//! WebSocket adapter - duplex session relay between a client connection
//! and the broker.

mod relay;
mod session;

pub use relay::{run_session, CONTROL_TOKEN};
pub use session::{Session, SessionId, SessionState};
