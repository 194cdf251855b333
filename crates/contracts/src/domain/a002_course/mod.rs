pub mod aggregate;
pub mod builder;
pub mod factory;
pub mod feedback;
pub mod merge;
