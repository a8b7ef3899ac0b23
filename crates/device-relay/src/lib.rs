pub mod announcer;
pub mod relay;

pub use announcer::{AnnounceError, CallAnnouncer};
pub use relay::{IncomingPush, OsCompletion, PushRelay, RelayEvent};
