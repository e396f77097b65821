#![forbid(unsafe_code)]

pub mod admission;
pub mod config;
pub mod error;
pub mod gate;
pub mod telemetry;

pub use admission::{
    AdmissionController, AdmissionDecision, AdmissionRequest, AuthContext, TrafficClass,
};
pub use config::{load_from_path, Config, RouteRules};
pub use error::{GateError, Result};
pub use gate::{run, serve, GateState};
