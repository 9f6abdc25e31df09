//! Interactive walking-route planner core.
//!
//! Waypoints placed on a map are connected pairwise by walking segments from a
//! routing provider; distance and elevation totals follow the segments, and a
//! finished route is assembled and handed to the routes API.

pub mod assembler;
pub mod computer;
pub mod config;
pub mod error;
pub mod google;
pub mod metrics;
pub mod persistence;
pub mod provider;
pub mod render;
pub mod runtime;
pub mod segments;
pub mod session;
pub mod waypoints;

pub use config::PlannerConfig;
pub use error::{ConfigError, PersistenceError, ProviderError, ValidationError};
pub use google::GoogleMapsClient;
pub use metrics::RouteMetrics;
pub use persistence::{HttpRouteApi, RouteApi};
pub use render::{MapRenderer, RecordingRenderer, TracingRenderer};
pub use runtime::{MsgSender, Runtime};
pub use session::{update, Cmd, Model, Msg, Orders, RouteLibrary};
