//! Datatype parsing layer (spec §4.1): the dynamic value model, the
//! numeric/date/duration parsers it's built from, and the per-URI
//! dispatcher that ties them together.

pub mod datetime;
pub mod duration;
pub mod numeric;
pub mod registry;
pub mod value;

pub use registry::{Datatype, ValueFormat};
pub use value::Value;
