//! ECS Systems module

pub mod hierarchy;

pub use hierarchy::TransformHierarchy;
