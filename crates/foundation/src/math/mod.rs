pub mod camera;
pub mod format;
pub mod sphere;
pub mod vec;

pub use camera::*;
pub use format::*;
pub use sphere::*;
pub use vec::*;
