//! Step-based simulation coordinator
//!
//! Owns the [`World`] and the per-frame systems and runs them in a fixed
//! order. One [`Simulation::step`]:
//!
//! 1. settle the transform hierarchy,
//! 2. run collision detection against the settled matrices,
//! 3. optionally push overlapping dynamic colliders apart and settle again.
//!
//! Visibility queries are separate from stepping: callers cull as many
//! cameras as they like between steps.

use crate::config::{ConfigError, CoreConfig};
use crate::ecs::{Entity, World};
use crate::foundation::time::{micros, Stopwatch};
use crate::physics::{resolve_penetrations, CollisionDetector};
use crate::scene::{CameraView, CullStats, SpatialCuller};

/// What one [`Simulation::step`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Step number, starting at 1
    pub step: u64,
    /// World matrices recomputed by the first hierarchy update
    pub transforms_updated: usize,
    /// Collider pairs that reached the narrow phase
    pub pairs_tested: usize,
    /// Collision events emitted (two per overlapping pair)
    pub collision_events: usize,
    /// Entities moved by penetration response
    pub entities_pushed: usize,
    /// World matrices recomputed after the response
    pub transforms_resettled: usize,
    /// Time spent in the first hierarchy update, in microseconds
    pub update_micros: u64,
    /// Time spent in collision detection, in microseconds
    pub collision_micros: u64,
    /// Time spent in penetration response and the second update, in microseconds
    pub response_micros: u64,
}

impl StepReport {
    /// Sum of the phase timings
    pub fn total_micros(&self) -> u64 {
        self.update_micros + self.collision_micros + self.response_micros
    }
}

/// The world plus the systems that run over it
pub struct Simulation {
    config: CoreConfig,
    world: World,
    collisions: CollisionDetector,
    culler: SpatialCuller,
    steps: u64,
}

impl Simulation {
    /// Create a simulation, panicking on an invalid configuration
    pub fn new(config: CoreConfig) -> Self {
        match Self::try_new(config) {
            Ok(simulation) => simulation,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create a simulation after validating `config`
    pub fn try_new(config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "Creating simulation: {} entities, {} components per type",
            config.max_entities,
            config.max_components_per_type
        );

        Ok(Self {
            world: World::new(&config),
            collisions: CollisionDetector::new(config.collision.clone()),
            culler: SpatialCuller::new(config.culling.clone()),
            config,
            steps: 0,
        })
    }

    /// Configuration the simulation was built with
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Entities and components
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to entities and components
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Collision results of the last step
    pub fn collisions(&self) -> &CollisionDetector {
        &self.collisions
    }

    /// Visibility culler
    pub fn culler(&self) -> &SpatialCuller {
        &self.culler
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Advance one step
    pub fn step(&mut self) -> StepReport {
        self.steps += 1;
        let mut report = StepReport { step: self.steps, ..StepReport::default() };
        let mut stopwatch = Stopwatch::start_new();

        report.transforms_updated = self.world.hierarchy().update();
        report.update_micros = stopwatch.lap_micros();

        let events = self.collisions.check_collisions(&self.world);
        report.collision_events = events.len();
        report.pairs_tested = self.collisions.pairs_tested();
        report.collision_micros = stopwatch.lap_micros();

        if self.config.collision.resolve_penetrations && report.collision_events > 0 {
            report.entities_pushed = resolve_penetrations(&mut self.world, self.collisions.events());
            report.transforms_resettled = self.world.hierarchy().update();
            report.response_micros = stopwatch.lap_micros();
        }

        log::debug!(
            "Step {}: {} transforms, {} pairs, {} events, {} pushed in {}us",
            report.step,
            report.transforms_updated,
            report.pairs_tested,
            report.collision_events,
            report.entities_pushed,
            micros(stopwatch.elapsed())
        );
        report
    }

    /// Rebuild the static BVH from the current world
    ///
    /// Static geometry that moved since the last rebuild is culled at its old
    /// position until this is called.
    pub fn rebuild_static_geometry(&mut self) -> usize {
        self.culler.rebuild_static(&self.world)
    }

    /// Entities whose bounds intersect the camera's frustum
    pub fn visible_entities(&self, camera: &CameraView) -> Vec<Entity> {
        let mut visible = Vec::new();
        self.cull(camera, &mut visible);
        visible
    }

    /// Append visible entities to `visible` and report culling counters
    pub fn cull(&self, camera: &CameraView, visible: &mut Vec<Entity>) -> CullStats {
        self.culler.cull(&self.world, &camera.frustum(), visible)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{BoundsComponent, ColliderComponent, TransformComponent};
    use crate::foundation::math::{Mat4, Vec3};
    use crate::physics::ColliderShape;
    use approx::assert_relative_eq;

    fn spawn_box(simulation: &mut Simulation, position: Vec3, is_static: bool) -> Entity {
        let world = simulation.world_mut();
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_translation(position));
        let mut collider = ColliderComponent::new(ColliderShape::cuboid(Vec3::new(0.5, 0.5, 0.5)));
        collider.is_static = is_static;
        world.add_component(entity, collider);
        world.add_component(entity, BoundsComponent::cuboid(Vec3::new(0.5, 0.5, 0.5), is_static));
        entity
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CoreConfig { max_entities: 0, ..CoreConfig::default() };
        assert!(matches!(Simulation::try_new(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    #[should_panic(expected = "max_entities")]
    fn test_invalid_config_panics() {
        Simulation::new(CoreConfig { max_entities: 0, ..CoreConfig::default() });
    }

    #[test]
    fn test_step_settles_detects_and_resolves() {
        let mut simulation = Simulation::new(CoreConfig::with_capacity(16));
        let _floor = spawn_box(&mut simulation, Vec3::zeros(), true);
        let falling = spawn_box(&mut simulation, Vec3::new(0.0, 0.9, 0.0), false);

        let report = simulation.step();
        assert_eq!(report.step, 1);
        assert_eq!(report.transforms_updated, 2);
        assert_eq!(report.pairs_tested, 1);
        assert_eq!(report.collision_events, 2);
        assert_eq!(report.entities_pushed, 1);
        assert_eq!(report.transforms_resettled, 1);

        let settled = simulation.world_mut().hierarchy().world_matrix(falling);
        assert_relative_eq!(settled.m24, 1.0, epsilon = 1e-5);

        // Touching faces no longer count as a collision
        let report = simulation.step();
        assert_eq!(report.step, 2);
        assert_eq!(report.transforms_updated, 0);
        assert_eq!(report.collision_events, 0);
        assert!(!simulation.collisions().is_colliding(falling));
    }

    #[test]
    fn test_response_can_be_disabled() {
        let mut config = CoreConfig::with_capacity(16);
        config.collision.resolve_penetrations = false;
        let mut simulation = Simulation::new(config);
        let a = spawn_box(&mut simulation, Vec3::zeros(), false);
        let b = spawn_box(&mut simulation, Vec3::new(0.5, 0.0, 0.0), false);

        for _ in 0..3 {
            let report = simulation.step();
            assert_eq!(report.collision_events, 2);
            assert_eq!(report.entities_pushed, 0);
            assert_eq!(report.response_micros, 0);
        }
        assert!(simulation.collisions().is_colliding(a));
        assert!(simulation.collisions().is_colliding(b));
        assert_eq!(simulation.step_count(), 3);
    }

    #[test]
    fn test_visibility_after_rebuild() {
        let mut simulation = Simulation::default();
        let ahead = spawn_box(&mut simulation, Vec3::new(0.0, 0.0, -10.0), true);
        let behind = spawn_box(&mut simulation, Vec3::new(0.0, 0.0, 10.0), true);
        simulation.step();

        let camera = CameraView::perspective(1.0, 1.2, 0.1, 100.0, Mat4::identity());
        assert!(simulation.visible_entities(&camera).is_empty());

        assert_eq!(simulation.rebuild_static_geometry(), 2);
        assert_eq!(simulation.visible_entities(&camera), vec![ahead]);

        let reversed = CameraView::perspective(
            1.0,
            1.2,
            0.1,
            100.0,
            Mat4::from_euler_angles(0.0, std::f32::consts::PI, 0.0),
        );
        let mut visible = Vec::new();
        let stats = simulation.cull(&reversed, &mut visible);
        assert_eq!(visible, vec![behind]);
        assert_eq!(stats.static_candidates, 2);
    }
}
