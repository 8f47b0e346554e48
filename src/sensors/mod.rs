//! Sensor subsystem: the particulate frame decoder and the front-panel
//! switch inputs.

pub mod pms;
pub mod switches;
