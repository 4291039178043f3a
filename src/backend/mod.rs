//! Implementations of the collaborator contracts.
//!
//! `memory` runs without a physics engine; `avian` (feature `dim3`) answers
//! queries from the avian3d spatial query pipeline inside Bevy systems.

#[cfg(feature = "dim3")]
pub mod avian;
pub mod memory;
