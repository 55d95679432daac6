pub mod control;
pub mod logging;
pub mod pacing;

pub use control::ControlHandle;
pub use pacing::Pacing;
