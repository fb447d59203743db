//! CLI sub-commands

pub mod capture;
pub mod caps;
pub mod scene;
