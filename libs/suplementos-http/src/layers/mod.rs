//! Tower layers for the HTTP client middleware stack
//!
//! - [`UserAgentLayer`] - Adds a User-Agent header to all outbound requests

mod user_agent;

pub use user_agent::{UserAgentLayer, UserAgentService};
