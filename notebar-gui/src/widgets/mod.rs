//! # Widgets Module
//!
//! Canvas widgets drawn inside the main display.

pub mod bar_graph;
