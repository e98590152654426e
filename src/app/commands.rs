//! Inbound commands to the application service.
//!
//! These are the user actions from the button panel.  The service turns
//! press edges into commands itself during a tick; adapters may also send
//! them directly through [`AppService::handle_command`](super::service::AppService::handle_command).

use crate::drivers::button::Button;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Container was refilled: zero the running total.
    ResetContainer,

    /// Wipe statistics and timing checkpoints.
    FactoryReset,

    /// Flip the display backlight.
    ToggleBacklight,

    /// Stop pumping now and block it for an hour.
    ForceStop,
}

impl AppCommand {
    /// Command bound to a button press, if any.
    pub fn for_button(button: Button) -> Option<Self> {
        match button {
            Button::ResetContainer => Some(Self::ResetContainer),
            Button::FactoryReset => Some(Self::FactoryReset),
            Button::Backlight => Some(Self::ToggleBacklight),
            Button::ForceStop => Some(Self::ForceStop),
            Button::ShowTimes | Button::ShowContainer | Button::Aux2 | Button::Aux7 => None,
        }
    }

    /// Order for commands raised on the same tick, lowest first.  A reset
    /// must not disarm a force stop requested alongside it.
    pub const fn priority(self) -> u8 {
        match self {
            Self::FactoryReset => 0,
            Self::ResetContainer => 1,
            Self::ToggleBacklight => 2,
            Self::ForceStop => 3,
        }
    }
}
