// Foundation crate: small, well-tested primitives only.
pub mod math;
pub mod time;

pub use time::*;
