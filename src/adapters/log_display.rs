//! Log-backed character display.
//!
//! Implements [`DisplayPort`] by logging each frame that differs from the
//! previous one.  Stands in for the I²C 16x2 LCD, whose driver is outside
//! this crate; swapping in a real panel means implementing the same two
//! methods.

use log::info;

use crate::app::ports::DisplayPort;
use crate::presentation::Frame;

#[derive(Default)]
pub struct LogDisplay {
    last: Option<(crate::presentation::Line, crate::presentation::Line)>,
    backlight: bool,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backlight(&self) -> bool {
        self.backlight
    }
}

impl DisplayPort for LogDisplay {
    fn show(&mut self, frame: &Frame) {
        let lines = (frame.line1.clone(), frame.line2.clone());
        if self.last.as_ref() != Some(&lines) {
            info!("LCD |{}|{}|", frame.line1, frame.line2);
            self.last = Some(lines);
        }
    }

    fn set_backlight(&mut self, on: bool) {
        if on != self.backlight {
            info!("LCD | backlight {}", if on { "on" } else { "off" });
            self.backlight = on;
        }
    }
}
