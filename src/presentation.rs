//! Presentation contract: what the 16x2 display and the alarm output show.
//!
//! Pure functions of a [`StatusView`] snapshot.  Nothing here feeds back
//! into scheduling; the only upstream effects of the panel are the button
//! commands handled by the service.
//!
//! Display modes, first match wins on the buttons currently held:
//!
//! | Held | Mode                 | Line 1              | Line 2                  |
//! |------|----------------------|---------------------|-------------------------|
//! | 5    | container summary    | `Pumped: 1.20 l`    | `Left: 26.80 l`         |
//! | 4    | force-stop notice    | `Force stopping`    | `for 1 hour`            |
//! | 6    | container filled     | `Container`         | `filled`                |
//! | 1    | elapsed times        | `Wet 12 min ago`    | `Pumped 3 min ago`      |
//! | —    | dashboard            | ` 0.3  2.4 1h 5m`   | `95% DrMoSt  9:41`      |

use core::fmt::{self, Write};

use heapless::String;

use crate::clock;
use crate::config::SystemConfig;
use crate::drivers::button::{Button, ButtonSet};
use crate::fsm::StateId;

/// Display width in characters.
pub const LINE_WIDTH: usize = 16;

pub type Line = String<LINE_WIDTH>;

/// Everything the presentation layer may look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub now_ms: u64,
    pub state: StateId,
    pub today_ml: u16,
    pub yesterday_ml: u16,
    pub pumped_total_ml: u32,
    pub capacity_ml: u32,
    pub water_detected: bool,
    pub motion_detected: bool,
    /// Active interlock channels (see `InterlockChannel::mask`).
    pub interlock_mask: u8,
    pub force_stop_active: bool,
    pub last_wet_ms: Option<u64>,
    pub pump_started_ms: u64,
    pub held: ButtonSet,
    pub backlight_on: bool,
}

impl StatusView {
    pub fn remaining_ml(&self) -> u32 {
        self.capacity_ml.saturating_sub(self.pumped_total_ml)
    }

    /// Remaining volume as a two-digit percentage (0–99).
    pub fn remaining_percent(&self) -> u32 {
        if self.capacity_ml == 0 {
            return 0;
        }
        let pct = u64::from(self.remaining_ml().saturating_sub(1)) * 100
            / u64::from(self.capacity_ml);
        u32::try_from(pct).unwrap_or(99)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    ContainerSummary,
    ForceStopNotice,
    ContainerFilled,
    ElapsedTimes,
    Dashboard,
}

impl DisplayMode {
    pub fn select(held: ButtonSet) -> Self {
        if held.contains(Button::ShowContainer) {
            Self::ContainerSummary
        } else if held.contains(Button::ForceStop) {
            Self::ForceStopNotice
        } else if held.contains(Button::ResetContainer) {
            Self::ContainerFilled
        } else if held.contains(Button::ShowTimes) {
            Self::ElapsedTimes
        } else {
            Self::Dashboard
        }
    }
}

/// One rendered display refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub mode: DisplayMode,
    pub line1: Line,
    pub line2: Line,
    /// Alarm output level (0 = silent).
    pub alarm: u8,
}

/// Low-water alarm parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmPolicy {
    pub intensity: u8,
    pub low_water_threshold_ml: u32,
    pub pulse_period_ms: u32,
    pub pulse_width_ms: u32,
}

impl AlarmPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            intensity: config.alarm_intensity,
            low_water_threshold_ml: config.low_water_threshold_ml,
            pulse_period_ms: config.alarm_pulse_period_ms,
            pulse_width_ms: config.alarm_pulse_width_ms,
        }
    }

    /// Alarm level for `view`.
    ///
    /// Held backlight button: on.  Otherwise, while remaining water is
    /// below the threshold and no force stop is active, on for the first
    /// `pulse_width_ms` of every `pulse_period_ms`.
    pub fn level(&self, view: &StatusView) -> u8 {
        if view.held.contains(Button::Backlight) {
            return self.intensity;
        }
        let low = view.remaining_ml() < self.low_water_threshold_ml;
        let phase = view.now_ms % u64::from(self.pulse_period_ms.max(1));
        if low && phase < u64::from(self.pulse_width_ms) && !view.force_stop_active {
            self.intensity
        } else {
            0
        }
    }
}

/// Render the display and alarm for one tick.
pub fn render(view: &StatusView, policy: &AlarmPolicy) -> Frame {
    let mode = DisplayMode::select(view.held);
    let (line1, line2) = match mode {
        DisplayMode::ContainerSummary => (
            line(format_args!("Pumped: {} l", Litres::<2>(view.pumped_total_ml))),
            line(format_args!("Left: {} l", Litres::<2>(view.remaining_ml()))),
        ),
        DisplayMode::ForceStopNotice => (
            line(format_args!("Force stopping")),
            line(format_args!("for 1 hour")),
        ),
        DisplayMode::ContainerFilled => (
            line(format_args!("Container")),
            line(format_args!("filled")),
        ),
        DisplayMode::ElapsedTimes => (
            match view.last_wet_ms {
                Some(t) => line(format_args!("Wet {} min ago", clock::minutes_ago(view.now_ms, t))),
                None => line(format_args!("Wet never")),
            },
            line(format_args!(
                "Pumped {} min ago",
                clock::minutes_ago(view.now_ms, view.pump_started_ms)
            )),
        ),
        DisplayMode::Dashboard => dashboard(view),
    };
    Frame {
        mode,
        line1,
        line2,
        alarm: policy.level(view),
    }
}

fn dashboard(view: &StatusView) -> (Line, Line) {
    let today = Litres::<1>(u32::from(view.today_ml));
    let yesterday = Litres::<1>(u32::from(view.yesterday_ml));
    // While wet: how long since the dose that (probably) caused it.
    // While dry: how long since it was last wet.
    let since = if view.water_detected {
        Some(view.pump_started_ms)
    } else {
        view.last_wet_ms
    };
    let line1 = match since {
        Some(t) => {
            let mins = clock::minutes_ago(view.now_ms, t);
            line(format_args!("{today:>4} {yesterday:>4} {}h {}m", mins / 60, mins % 60))
        }
        None => line(format_args!("{today:>4} {yesterday:>4} --")),
    };

    let (hour, minute) = clock::hour_minute(view.now_ms);
    let line2 = line(format_args!(
        "{:>2}% {}{}{} {:>2}:{:02}",
        view.remaining_percent(),
        if view.water_detected { "We" } else { "Dr" },
        if view.motion_detected { "Mo" } else { "  " },
        if view.interlock_mask != 0 { "St" } else { "  " },
        hour,
        minute
    ));
    (line1, line2)
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Millilitres shown as litres with `D` decimals, rounded half up.
struct Litres<const D: u32>(u32);

impl<const D: u32> fmt::Display for Litres<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u64.pow(3 - D.min(3));
        let units = (u64::from(self.0) + scale / 2) / scale;
        let per_litre = 1000 / scale;
        let mut buf: String<16> = String::new();
        if D == 0 {
            write!(buf, "{units}")?;
        } else {
            write!(
                buf,
                "{}.{:0width$}",
                units / per_litre,
                units % per_litre,
                width = D as usize
            )?;
        }
        f.pad(&buf)
    }
}

/// Writer that keeps the first `LINE_WIDTH` characters and drops the rest.
struct Clipped<'a>(&'a mut Line);

impl Write for Clipped<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format into exactly `LINE_WIDTH` characters (clipped, space padded).
fn line(args: fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    // Clipped never reports an error.
    let _ = Clipped(&mut out).write_fmt(args);
    while out.push(' ').is_ok() {}
    out
}
