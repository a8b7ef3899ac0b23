pub mod models;
pub mod payload;

pub use models::{CallInvite, CallRequest, CallResponse, DeviceTokens, Platform, SendOutcome};
pub use payload::{build, PushPayload};
