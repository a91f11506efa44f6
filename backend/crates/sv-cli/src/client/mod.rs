pub(crate) mod client;
pub(crate) mod error;

pub use client::{Client, resolve_path};
pub use error::{ClientError, Result as CliClientResult};
