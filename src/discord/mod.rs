pub mod client;
pub mod commands;
pub mod common;

pub use client::create_client;
pub use common::{Context, Data};
