mod build;

pub use build::{BuildArgs, build};
