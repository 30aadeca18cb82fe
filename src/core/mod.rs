pub mod admission;
pub mod analytics;
pub mod lifecycle;
pub mod settlement;
