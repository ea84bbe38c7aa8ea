pub mod request;
pub mod response;

pub use request::SyncRequest;
pub use response::{SyncErrorKind, SyncResponse};
