//! # vetrec Client
//!
//! HTTP implementation of the [`vetrec_core::ResourceClient`] seam.
//!
//! Requests and responses go through a wire layer ([`wire`]) kept apart from the core domain
//! types. Transport failures are mapped to [`vetrec_core::ClientError`] here so the workflow
//! never sees `reqwest` types.

pub mod config;
pub mod constants;
pub mod http;
mod wire;

pub use config::{
    api_base_url_from_env_value, request_timeout_from_env_value, ClientConfig, ClientConfigError,
    ClientConfigResult,
};
pub use http::HttpResourceClient;
