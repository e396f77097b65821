//! HTTP front door: extracts the admission view of each request, applies the admission
//! decision and forwards admitted traffic to the upstream.

pub mod forwarding;
pub mod handler;
pub mod http_result;
pub mod request;
pub mod response;
pub mod server;

pub use forwarding::UpstreamClient;
pub use http_result::HttpError;
pub use server::{run, serve, GateState};
