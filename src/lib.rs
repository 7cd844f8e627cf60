// Public library interface for revmap-rs
// The diagnostic CLI tool uses the same modules

pub mod entity;
pub mod layout;
pub mod render;
pub mod session;

pub use entity::{Entity, EntityId};
pub use layout::{apportion, grid_dimensions, pack, ColumnConfig, GridConfig, GridDims};
pub use session::MapSession;
