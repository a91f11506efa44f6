pub mod error;
pub mod servers;
