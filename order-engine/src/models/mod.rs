pub mod config;
pub mod ingress;
pub mod order;

pub use config::*;
pub use ingress::*;
pub use order::*;
