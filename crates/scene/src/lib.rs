pub mod orbit;
pub mod picking;
pub mod prefabs;
pub mod world;

pub use orbit::*;
pub use picking::*;
pub use world::*;
