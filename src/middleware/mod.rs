//! Middleware module
//!
//! HTTP middleware for the request gate, request logging and metrics.

pub mod auth;
pub mod logging;
pub mod metrics;

pub use auth::{
    require_api_key, AuthError, GateDecision, GateRequest, GateStep, RequestGate, API_KEY_HEADER,
};
pub use logging::{log_request, TraceId, REQUEST_ID_HEADER, TRACE_ID_HEADER};
pub use metrics::{track_metrics, HttpMetrics};
