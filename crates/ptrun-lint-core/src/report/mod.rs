pub mod model;
pub mod render;

pub use model::{Report, ToolInfo};
