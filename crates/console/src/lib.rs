//! Interactive console session engine for the animation server.
//!
//! The engine is built from four pieces: the scrollback buffer
//! ([`scroll::ScrollBuffer`]), the line editor ([`editor::LineEditor`]), the
//! terminal renderer ([`render::Renderer`]), and the session controller
//! ([`session::SessionController`]) that owns all three and serializes every
//! state mutation through one event loop.

pub mod config;
pub mod editor;
pub mod render;
pub mod router;
pub mod scroll;
pub mod session;
