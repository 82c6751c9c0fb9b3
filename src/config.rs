use crate::handles::HandleRegistry;
use crate::ir::{Dimensions, Direction};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Size assumed for nodes the host has not measured yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSizeDefaults {
    pub width: f64,
    pub height: f64,
}

impl Default for NodeSizeDefaults {
    fn default() -> Self {
        Self {
            width: 280.0,
            height: 200.0,
        }
    }
}

impl NodeSizeDefaults {
    /// Measured size when usable, the defaults otherwise.
    pub fn resolve(&self, dimensions: Option<Dimensions>) -> (f64, f64) {
        match dimensions {
            Some(dims) if dims.is_usable() => (dims.width, dims.height),
            _ => (self.width, self.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionConfig {
    /// Minimum clearance between two node boxes on at least one axis.
    pub min_gap: f64,
    pub max_iterations: usize,
    /// Extra distance each node of a separated pair moves beyond half the overlap.
    pub separation_slack: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            min_gap: 40.0,
            max_iterations: 100,
            separation_slack: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub direction: Direction,
    /// Gap between neighbouring nodes of the same rank.
    pub node_spacing: f64,
    /// Gap between consecutive ranks.
    pub rank_spacing: f64,
    pub order_passes: usize,
    pub node_size: NodeSizeDefaults,
    pub collision: CollisionConfig,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::TopBottom,
            node_spacing: 60.0,
            rank_spacing: 100.0,
            order_passes: 4,
            node_size: NodeSizeDefaults::default(),
            collision: CollisionConfig::default(),
        }
    }
}

impl LayoutOptions {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("nodeSpacing", self.node_spacing)?;
        non_negative("rankSpacing", self.rank_spacing)?;
        non_negative("collision.minGap", self.collision.min_gap)?;
        non_negative("collision.separationSlack", self.collision.separation_slack)?;
        positive("nodeSize.width", self.node_size.width)?;
        positive("nodeSize.height", self.node_size.height)?;
        if self.collision.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, value })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutOptions,
    pub handles: HandleRegistry,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is neither valid JSON nor JSON5: {0}")]
    Parse(#[from] json5::Error),
    #[error("unknown direction `{0}` (expected TB, LR, BT or RL)")]
    Direction(String),
    #[error("`{field}` is out of range (got {value})")]
    Invalid { field: &'static str, value: f64 },
    #[error("`collision.maxIterations` must be at least 1")]
    ZeroIterations,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NodeSizeConfigFile {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CollisionConfigFile {
    min_gap: Option<f64>,
    max_iterations: Option<usize>,
    separation_slack: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    direction: Option<String>,
    node_spacing: Option<f64>,
    rank_spacing: Option<f64>,
    order_passes: Option<usize>,
    node_size: Option<NodeSizeConfigFile>,
    collision: Option<CollisionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    handles: Option<HandleRegistry>,
}

/// Parses a config document, accepting strict JSON first and JSON5 second.
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };

    let mut config = Config::default();
    if let Some(layout) = parsed.layout {
        apply_layout_file(&mut config.layout, layout)?;
    }
    if let Some(handles) = parsed.handles {
        config.handles = handles;
    }
    config.layout.validate()?;
    Ok(config)
}

fn apply_layout_file(
    options: &mut LayoutOptions,
    file: LayoutConfigFile,
) -> Result<(), ConfigError> {
    if let Some(token) = file.direction {
        options.direction =
            Direction::from_token(&token).ok_or_else(|| ConfigError::Direction(token.clone()))?;
    }
    if let Some(v) = file.node_spacing {
        options.node_spacing = v;
    }
    if let Some(v) = file.rank_spacing {
        options.rank_spacing = v;
    }
    if let Some(v) = file.order_passes {
        options.order_passes = v;
    }
    if let Some(size) = file.node_size {
        if let Some(v) = size.width {
            options.node_size.width = v;
        }
        if let Some(v) = size.height {
            options.node_size.height = v;
        }
    }
    if let Some(collision) = file.collision {
        if let Some(v) = collision.min_gap {
            options.collision.min_gap = v;
        }
        if let Some(v) = collision.max_iterations {
            options.collision.max_iterations = v;
        }
        if let Some(v) = collision.separation_slack {
            options.collision.separation_slack = v;
        }
    }
    Ok(())
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    tracing::debug!(
        path = %path.display(),
        direction = config.layout.direction.token(),
        handle_types = config.handles.len(),
        "loaded config"
    );
    Ok(config)
}
