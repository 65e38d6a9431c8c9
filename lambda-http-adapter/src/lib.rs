#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

// These are documented public exports since controllers implemented outside this crate depend on
// them.
pub use async_trait;
pub use http::StatusCode;
pub use serde_json;

mod adapter;

pub use adapter::LambdaHttpAdapter;

mod body;

pub use body::{BodyParser, JsonBodyParser};

/// Adapter configuration.
pub mod config;

pub use config::AdapterConfig;

mod controller;

pub use controller::Controller;

/// Error envelopes and their serialization.
pub mod envelope;

pub use envelope::{ErrorEnvelope, ErrorFormatter, JsonErrorFormatter};

/// Error handling.
pub mod error;

pub use error::{ApplicationError, ErrorCode, HandlerError, HttpError, ValidationError};

mod event;

pub use event::{IncomingEvent, JwtAuthorizer, RequestContext};

mod registry;

pub use registry::Registry;

mod request;

pub use request::NormalizedRequest;

mod response;

pub use response::{AdaptedResponse, HandlerResult};

mod runtime;

pub use runtime::run_lambda;
