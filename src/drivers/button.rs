//! Eight-button panel with press-edge detection.
//!
//! ## Hardware
//!
//! Active-low momentary switches on internal pull-ups.  There is no
//! hardware debounce: levels are sampled once per control tick and a
//! press is reported on the tick a button goes from released to held.
//! Holding a button never repeats its action.
//!
//! | Button | Role                          |
//! |--------|-------------------------------|
//! | 1      | show elapsed times (held)     |
//! | 3      | backlight toggle / alarm held |
//! | 4      | force stop                    |
//! | 5      | show container (held)         |
//! | 6      | container refilled            |
//! | 8      | factory reset                 |
//!
//! Buttons 2 and 7 are wired but unassigned.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Simulated pressed-mask for host builds.
#[cfg(not(target_os = "espidf"))]
static SIM_PRESSED: AtomicU8 = AtomicU8::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_pressed(buttons: ButtonSet) {
    SIM_PRESSED.store(buttons.bits(), Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Button {
    ShowTimes = 0,
    Aux2 = 1,
    Backlight = 2,
    ForceStop = 3,
    ShowContainer = 4,
    ResetContainer = 5,
    Aux7 = 6,
    FactoryReset = 7,
}

impl Button {
    pub const ALL: [Self; 8] = [
        Self::ShowTimes,
        Self::Aux2,
        Self::Backlight,
        Self::ForceStop,
        Self::ShowContainer,
        Self::ResetContainer,
        Self::Aux7,
        Self::FactoryReset,
    ];

    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// Panel label, 1-based.
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }
}

/// A set of buttons as a bitmask (bit `n` = button `n + 1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | button.mask())
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Sample every button.  Pressed = true.
#[cfg(target_os = "espidf")]
pub fn read_pressed() -> ButtonSet {
    Button::ALL
        .into_iter()
        .filter(|b| !hw_init::gpio_read(pins::BUTTON_GPIOS[*b as usize]))
        .collect()
}

/// Sample every button.  Pressed = true.
#[cfg(not(target_os = "espidf"))]
pub fn read_pressed() -> ButtonSet {
    ButtonSet::from_bits(SIM_PRESSED.load(Ordering::Relaxed))
}

/// Edge detector over successive samples.
#[derive(Debug, Clone, Default)]
pub struct ButtonDriver {
    previous: ButtonSet,
}

impl ButtonDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this tick's sample; returns buttons that went down since the
    /// previous one.
    pub fn tick(&mut self, held: ButtonSet) -> ButtonSet {
        let pressed = ButtonSet(held.0 & !self.previous.0);
        self.previous = held;
        pressed
    }
}
