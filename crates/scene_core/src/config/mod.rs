//! Configuration system
//!
//! Capacities and tuning constants for the simulation core. Values are read
//! once at start-up (TOML or RON) and fixed for the lifetime of a [`World`].
//!
//! [`World`]: crate::ecs::World

use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("ron") => Self::from_ron_str(&contents),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for the simulation core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Maximum number of simultaneously live entities
    pub max_entities: usize,

    /// Maximum number of components any single storage may hold
    pub max_components_per_type: usize,

    /// Narrow-phase collision settings
    pub collision: CollisionConfig,

    /// Visibility culling settings
    pub culling: CullingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_entities: 10_000,
            max_components_per_type: 10_000,
            collision: CollisionConfig::default(),
            culling: CullingConfig::default(),
        }
    }
}

impl Config for CoreConfig {}

impl CoreConfig {
    /// Configuration with both capacities set to `max_entities`
    pub fn with_capacity(max_entities: usize) -> Self {
        Self {
            max_entities,
            max_components_per_type: max_entities,
            ..Self::default()
        }
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entities == 0 {
            return Err(ConfigError::Invalid("max_entities must be greater than zero".into()));
        }
        if u32::try_from(self.max_entities).is_err() {
            return Err(ConfigError::Invalid(format!(
                "max_entities {} does not fit a 32-bit entity id",
                self.max_entities
            )));
        }
        if self.max_components_per_type == 0 {
            return Err(ConfigError::Invalid(
                "max_components_per_type must be greater than zero".into(),
            ));
        }
        if self.max_components_per_type > self.max_entities {
            return Err(ConfigError::Invalid(format!(
                "max_components_per_type ({}) exceeds max_entities ({})",
                self.max_components_per_type, self.max_entities
            )));
        }
        self.collision.validate()
    }
}

/// Narrow-phase collision settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// SAT candidate axes with a squared length below this are skipped
    pub degenerate_axis_epsilon: f32,

    /// Push dynamic colliders apart after detection and settle transforms again
    pub resolve_penetrations: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            degenerate_axis_epsilon: 1e-6,
            resolve_penetrations: true,
        }
    }
}

impl CollisionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.degenerate_axis_epsilon > 0.0 && self.degenerate_axis_epsilon.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "degenerate_axis_epsilon must be a positive finite number, got {}",
                self.degenerate_axis_epsilon
            )));
        }
        Ok(())
    }
}

/// Visibility culling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Frustum-test dynamic (non-BVH) bounds individually each cull. When
    /// off, every dynamic entity is reported visible.
    pub test_dynamic_entities: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            test_dynamic_entities: true,
        }
    }
}
