//! HTTP surface for the object storage aggregation system: axum router,
//! handlers, shared state, and the error envelope they all return through.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build;
pub use state::{ApiState, PendingAuthorization};
