//! Implementations of geographic points and projections.

pub mod point;
pub mod projection;
