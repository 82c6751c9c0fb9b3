#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod document;
pub mod handles;
pub mod ir;
pub mod layout;
pub mod layout_dump;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{CollisionConfig, Config, ConfigError, LayoutOptions, NodeSizeDefaults};
pub use document::{DocumentError, GraphDocument};
pub use handles::{HandleRegistry, HandleSlotIndex, NoHandleSlots};
pub use ir::{Dimensions, Direction, Edge, Node, Position};
pub use layout::{Arrangement, CollisionReport, arrange, layout, resolve_overlaps};
