//! Actuator drivers, button panel, and hardware initialisation.

pub mod alarm;
pub mod button;
pub mod hw_init;
pub mod pump;
