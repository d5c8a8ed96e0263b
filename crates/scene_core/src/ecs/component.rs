//! Component trait

use super::Entity;

/// Marker trait for components
///
/// `attach` is called by the storage when the value is added so components
/// that embed their owner's id can record it.
pub trait Component: 'static + Send + Sync {
    /// Record the owning entity
    fn attach(&mut self, _entity: Entity) {}
}
