//! Systems module - all ECS systems for the targeting plugins.

#[cfg(feature = "dim3")]
pub mod acquisition;
pub mod debug;
#[cfg(feature = "dim3")]
pub mod fire;
pub mod proxies;
