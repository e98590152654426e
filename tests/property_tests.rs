//! Property tests for the core data structures.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use plantwater::clock::TimeKeeper;
use plantwater::drivers::button::{Button, ButtonSet};
use plantwater::fsm::StateId;
use plantwater::presentation::{self, AlarmPolicy, LINE_WIDTH, StatusView};
use plantwater::config::SystemConfig;
use plantwater::safety::{InterlockChannel, SafetyInterlock};
use plantwater::scheduler::{ml_to_ms, ms_to_ml};
use plantwater::statistics::{HISTORY_SLOTS, PumpStatistics};
use proptest::prelude::*;

// ── Volume / time conversion ──────────────────────────────────

proptest! {
    /// Running the pump for the computed time never over-reports and
    /// under-reports by less than 1 ml.
    #[test]
    fn conversion_loses_under_one_ml(
        ml in 1u32..=10_000,
        flow in 1u16..=1_000,
    ) {
        let back = ms_to_ml(ml_to_ms(ml, flow), flow);
        prop_assert!(back <= ml);
        prop_assert!(back + 1 >= ml, "{ml} ml -> {back} ml at flow {flow}");
    }
}

// ── Statistics ────────────────────────────────────────────────

proptest! {
    #[test]
    fn total_is_sum_of_recorded_cycles(
        cycles in proptest::collection::vec(0u16..=500, 0..100),
    ) {
        let mut stats = PumpStatistics::new(1);
        for ml in &cycles {
            stats.record_pumped(*ml);
        }
        let sum: u32 = cycles.iter().map(|ml| u32::from(*ml)).sum();
        prop_assert_eq!(stats.pumped_total_ml, sum);
        prop_assert_eq!(u32::from(stats.today_ml()), sum.min(u32::from(u16::MAX)));
    }

    #[test]
    fn rollover_shifts_and_drops_oldest(
        slots in proptest::array::uniform24(any::<u16>()),
    ) {
        let mut stats = PumpStatistics::new(3);
        stats.slots = slots;
        prop_assert!(stats.observe_day(4));
        prop_assert!(!stats.observe_day(4));
        prop_assert_eq!(stats.slots[0], 0);
        prop_assert_eq!(&stats.slots[1..], &slots[..HISTORY_SLOTS - 1]);
    }
}

// ── Interlock ─────────────────────────────────────────────────

fn channel() -> impl Strategy<Value = InterlockChannel> {
    prop_oneof![
        Just(InterlockChannel::Wet),
        Just(InterlockChannel::ForceStop),
        Just(InterlockChannel::MotionStop),
    ]
}

proptest! {
    #[test]
    fn interlock_blocks_exactly_for_cooldown(
        ch in channel(),
        at in 0u64..1_000_000_000,
        later in 0u64..10_000_000,
    ) {
        let mut lock = SafetyInterlock::new();
        lock.trigger(ch, at);
        let now = at + later;
        prop_assert_eq!(lock.is_active(ch, now), later < ch.cooldown_ms());
        prop_assert_eq!(lock.can_start(now), later >= ch.cooldown_ms());
    }
}

// ── Clock correction ──────────────────────────────────────────

proptest! {
    /// Whatever the RTC reports, corrected time never falls below the
    /// floor and the checkpoint lands on the corrected time.
    #[test]
    fn correction_respects_floor(
        skew_ms in -10_000_000i64..10_000_000,
        floor_behind in 0u64..5_000_000,
    ) {
        let wall0 = 1_800_000_000_000u64;
        let mut keeper = TimeKeeper::anchored(wall0, 0);
        let mono = 3_600_001u64;
        let now = keeper.now(mono);
        let floor = now.saturating_sub(floor_behind);
        let rtc = (wall0 + mono).saturating_add_signed(skew_ms);

        keeper.correct(Some(rtc), mono, floor);
        prop_assert!(keeper.now(mono) >= floor);
        prop_assert_eq!(keeper.last_hour_started(), keeper.now(mono));
    }
}

// ── Presentation ──────────────────────────────────────────────

fn status_view() -> impl Strategy<Value = StatusView> {
    (
        any::<u64>(),
        any::<u16>(),
        any::<u16>(),
        any::<u32>(),
        1u32..=1_000_000,
        any::<(bool, bool)>(),
        0u8..8,
        any::<Option<u64>>(),
        any::<u8>(),
    )
        .prop_map(
            |(now, today, yesterday, total, capacity, (water, motion), mask, wet, held)| {
                StatusView {
                    now_ms: now % 10_000_000_000_000,
                    state: StateId::Idle,
                    today_ml: today,
                    yesterday_ml: yesterday,
                    pumped_total_ml: total,
                    capacity_ml: capacity,
                    water_detected: water,
                    motion_detected: motion,
                    interlock_mask: mask,
                    force_stop_active: mask & InterlockChannel::ForceStop.mask() != 0,
                    last_wet_ms: wet,
                    pump_started_ms: 0,
                    held: ButtonSet::from_bits(held),
                    backlight_on: false,
                }
            },
        )
}

proptest! {
    #[test]
    fn rendered_lines_always_fill_the_display(view in status_view()) {
        let frame = presentation::render(&view, &AlarmPolicy::from_config(&SystemConfig::default()));
        prop_assert_eq!(frame.line1.chars().count(), LINE_WIDTH);
        prop_assert_eq!(frame.line2.chars().count(), LINE_WIDTH);
    }

    #[test]
    fn percentage_is_two_digits(view in status_view()) {
        prop_assert!(view.remaining_percent() <= 99);
    }

    #[test]
    fn backlight_button_always_sounds(view in status_view()) {
        let held = StatusView { held: view.held.with(Button::Backlight), ..view };
        let policy = AlarmPolicy::from_config(&SystemConfig::default());
        prop_assert_eq!(policy.level(&held), policy.intensity);
    }
}
