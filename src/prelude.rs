//! A set of foundational traits, configuration types and entry points used throughout the library.
pub use crate::background::{snip1d, snip2d, snip3d, strip, Snip, Strip};
pub use crate::peak_search::{PeakCandidate, PeakSearcher, PeakSearcherBuilder};
pub use crate::peak_shapes::{FastExp, HypermetTerms, PeakShape, ShapeFamily};
pub use crate::smooth::SavitskyGolay;
