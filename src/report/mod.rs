//! The DS3 report codec: pure value logic for the input-report builder,
//! output-report parser, feature-report constructors/parsers, the flash
//! memory model, and the F1/F4 sub-command decoders. None of this module
//! touches a socket or a USB endpoint.
pub mod descriptor;
pub mod feature;
pub mod flash;
pub mod input;
pub mod output;

pub use feature::FeatureReport;
pub use input::{Button, InputReport};
pub use output::OutputReport;
