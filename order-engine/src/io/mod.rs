pub mod args;
pub mod fix;

pub use args::Args;
