use serde::{Deserialize, Serialize};

use super::errors::NavigationError;
use super::location::Location;

/// How a navigator write affects the environment's history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigateMode {
    Push,
    /// Overwrite the current entry; does not grow history.
    Replace,
}

impl std::fmt::Display for NavigateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigateMode::Push => write!(f, "push"),
            NavigateMode::Replace => write!(f, "replace"),
        }
    }
}

/// Writes locations into the host environment (router, address bar).
///
/// A successful return only means the write was accepted. The resulting
/// location change is still reported back through
/// `Coordinator::on_location_change`.
pub trait Navigator {
    fn navigate(&mut self, target: &Location, mode: NavigateMode) -> Result<(), NavigationError>;
}

/// Supplies the environment's current location at attach time.
pub trait LocationProvider {
    fn current(&self) -> Location;
}
