pub mod filters;
pub mod tags;
