//! Terminal UI pieces shared by the commands

pub mod picker;
pub mod style;
