pub mod entity;
pub mod pagination;

pub use entity::*;
pub use pagination::*;
