//! Error types shared by the HTTP layer

mod types;

pub use types::{ApiError, ErrorDetail, ErrorResponse};
