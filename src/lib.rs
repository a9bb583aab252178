#![doc(html_root_url = "https://docs.rs/lit-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod adapter;
pub mod chunk;
mod compile;
pub mod dom;
pub mod lifecycle;
pub mod markup;
pub mod materialize;
pub mod memory;
mod renderer;
pub mod scan_store;
pub mod store;
pub mod value;
pub mod warning;
pub mod web;

pub use adapter::{Config, ConfigAdapter, ConfigError, Output, Recognition, ViewAdapter};
pub use chunk::{Chunk, Component};
pub use compile::Template;
pub use dom::Dom;
pub use renderer::{Binding, Renderer};
pub use value::Value;
pub use warning::Warning;
