//! Screen-space overlay for the active globe pointer: click/drag
//! discrimination, the popup state machine and popup/connector placement.

pub mod gesture;
pub mod placement;
pub mod popup;

pub use gesture::*;
pub use placement::*;
pub use popup::*;
