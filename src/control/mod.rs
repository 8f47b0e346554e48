//! Control policies: fan speed targets and filter wear accounting.

pub mod speed;
pub mod usage;
