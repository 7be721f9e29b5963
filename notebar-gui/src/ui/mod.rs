//! # UI Module
//!
//! Layout for the note bar window.

pub mod main_display;
