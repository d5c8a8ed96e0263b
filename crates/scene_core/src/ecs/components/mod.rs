//! ECS Components module
//!
//! Data records attached to entities. Each lives in its own dense storage.

pub mod bounds;
pub mod collision;
pub mod transform;

pub use bounds::BoundsComponent;
pub use collision::ColliderComponent;
pub use transform::TransformComponent;
