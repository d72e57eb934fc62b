//! Request handlers for every update and read surface

pub mod common;
mod ping;
mod update;
mod value;

pub use ping::ping;
pub use update::{update_batch, update_metric_json, update_metric_path};
pub use value::{get_metric_json, get_metric_path};
