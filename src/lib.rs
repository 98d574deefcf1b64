//! Grainy Editorial — deterministic film-grain texture generator.
//!
//! [`render`] turns a [`GrainSettings`] record into an RGBA buffer; the same
//! settings always produce the same bytes.  [`Renderer`] wraps it for callers
//! that change settings faster than renders complete.

pub mod logger;

pub mod config;
pub mod io;
pub mod ops;
pub mod recipes;
pub mod renderer;
pub mod settings;

pub use ops::compositor::render;
pub use renderer::Renderer;
pub use settings::{GrainSettings, SettingsPatch, TextureType};
