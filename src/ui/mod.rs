//! Immediate-mode widgets, grouped by screen region.

pub mod panels;
pub mod table;
