//! Climate and Forecast (CF) metadata conventions used by the catalog.

pub mod axis;
pub mod time;

pub use axis::{Axis, time_axis, vertical_axis, vertical_levels};
pub use time::{Calendar, TimeError, TimeUnits, decode_time};
