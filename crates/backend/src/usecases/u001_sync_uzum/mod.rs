pub mod catalog_index;
pub mod executor;
pub mod reconciliation;
pub mod uzum_api_client;

pub use executor::{SyncError, SyncExecutor, SyncSummary};
pub use uzum_api_client::{UzumApi, UzumApiClient};
