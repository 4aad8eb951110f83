//! Vertical and time axis identification.
//!
//! A data variable names its dimensions through `_ARRAY_DIMENSIONS`; each
//! dimension usually has a coordinate array of the same name whose attributes
//! say what kind of axis it is. Lookups here never fail: a variable without
//! dimension names simply has no recognizable axes.

use crate::zarr::{ArrayHeader, DatasetHeader};

/// Dimension names used for vertical coordinates in CESM output.
pub const VERTICAL_DIMENSIONS: [&str; 11] = [
    "lev", "ilev", "z_t", "z_w", "z_t_150m", "z_w_top", "z_w_bot", "levgrnd", "levlak", "plev",
    "depth",
];

const VERTICAL_STANDARD_NAMES: [&str; 8] = [
    "air_pressure",
    "altitude",
    "depth",
    "height",
    "model_level_number",
    "atmosphere_hybrid_sigma_pressure_coordinate",
    "atmosphere_hybrid_height_coordinate",
    "ocean_sigma_coordinate",
];

/// One axis of a data variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis<'a> {
    /// Dimension name.
    pub name: &'a str,
    /// Position in the variable's shape.
    pub position: usize,
    /// Length of the dimension.
    pub len: u64,
}

fn is_vertical(name: &str, coord: Option<&ArrayHeader>) -> bool {
    if let Some(coord) = coord {
        if coord.attr_str("axis").is_some_and(|a| a.eq_ignore_ascii_case("Z"))
            || coord.attributes().contains_key("positive")
            || coord
                .attr_str("standard_name")
                .is_some_and(|s| VERTICAL_STANDARD_NAMES.contains(&s))
        {
            return true;
        }
    }
    VERTICAL_DIMENSIONS.contains(&name)
}

fn is_time(name: &str, coord: Option<&ArrayHeader>) -> bool {
    if let Some(coord) = coord {
        if coord.attr_str("axis").is_some_and(|a| a.eq_ignore_ascii_case("T"))
            || coord.attr_str("standard_name") == Some("time")
        {
            return true;
        }
    }
    name == "time"
}

fn find_axis<'a>(
    dataset: &DatasetHeader,
    variable: &'a ArrayHeader,
    pred: fn(&str, Option<&ArrayHeader>) -> bool,
) -> Option<Axis<'a>> {
    let dims = variable.dimensions()?;
    dims.iter()
        .zip(variable.shape())
        .enumerate()
        .find(|(_, (name, _))| pred(name, dataset.array(name)))
        .map(|(position, (name, len))| Axis {
            name: name.as_str(),
            position,
            len: *len,
        })
}

/// The first vertical dimension of `variable`.
pub fn vertical_axis<'a>(dataset: &DatasetHeader, variable: &'a ArrayHeader) -> Option<Axis<'a>> {
    find_axis(dataset, variable, is_vertical)
}

/// The time dimension of `variable`.
pub fn time_axis<'a>(dataset: &DatasetHeader, variable: &'a ArrayHeader) -> Option<Axis<'a>> {
    find_axis(dataset, variable, is_time)
}

/// Number of vertical levels of `variable`, 1 when it has no vertical axis.
pub fn vertical_levels(dataset: &DatasetHeader, variable: &ArrayHeader) -> u64 {
    vertical_axis(dataset, variable)
        .map(|axis| axis.len)
        .unwrap_or(1)
        .max(1)
}
