pub mod filters;
pub mod point_builder;
