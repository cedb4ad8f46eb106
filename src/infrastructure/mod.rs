pub mod engines;
pub mod observability;
