pub mod energy;
pub mod validate;
