mod build;
mod plan;

pub use build::{BuildArgs, cmd_build};
pub use plan::cmd_plan;
