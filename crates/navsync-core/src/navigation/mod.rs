//! Location tracking: the leaf every other component derives from.

pub mod errors;
pub mod location;
pub mod observer;
pub mod traits;

pub use errors::NavigationError;
pub use location::Location;
pub use observer::{NavigationEvent, NavigationHistory, NavigationObserver};
pub use traits::{LocationProvider, NavigateMode, Navigator};
