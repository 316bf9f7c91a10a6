pub mod bulk;
pub mod dashboard_api;

pub use bulk::{BulkCallbacks, BulkOperationError, BulkOperationOrchestrator, ConfigurationError, RunState};
pub use dashboard_api::{ApiError, DashboardApiClient};
