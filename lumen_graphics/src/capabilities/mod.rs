//! Device capability probing
//!
//! Features and limits are derived once per context from the driver, and
//! render-target format support is verified by actually attaching a 1x1
//! surface to a scratch framebuffer.

mod capability_set;
mod capability_prober;

pub use capability_set::{CapabilitySet, DriverPaths, Feature, Limit};
pub use capability_prober::{CapabilityProber, FormatQuery, FormatSupportCache};
