//! Monitoring policy
//!
//! Decides which entity types are audited under the configured
//! `MonitoringStrategy`, including subclasses of listed types and types
//! owned by monitored types through one-to-one or collection associations.

mod cache;
mod resolver;

pub use cache::{InvalidationScope, PolicyCache, PolicySnapshot};
pub use resolver::MonitoringPolicyResolver;
