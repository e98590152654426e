//! End-to-end controller scenarios: boot → ticks → pump / interlock /
//! statistics, driven through mock ports.
//!
//! Timing with the default config (100 ml at 116 ml/100 s, 15 min period):
//! the pump runs 86 206 ms, the idle window is 813 794 ms.  With 1 s ticks
//! from a fresh boot at t = 0 the first dose starts at 814 000 ms and
//! stops at 901 000 ms.

use crate::mock_hw::{MemStorage, MockClock, Rig, record_at};

use plantwater::app::events::AppEvent;
use plantwater::drivers::button::Button;
use plantwater::fsm::StateId;
use plantwater::fsm::context::CycleReport;
use plantwater::safety::InterlockChannel;

const STEP: u64 = 1_000;
const FIRST_START: u64 = 814_000;
const ONE_HOUR: u64 = 3_600_000;

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn fresh_boot_initialises_ledger() {
    let rig = Rig::boot_at(0);

    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.sink.contains(&AppEvent::LedgerInitialised));
    assert!(rig.sink.contains(&AppEvent::Started(StateId::Idle)));
    // Seven fields plus the marker.
    assert_eq!(rig.ledger.storage().writes, 8);
    assert_eq!(rig.app.statistics().pumped_total_ml, 0);
    assert!(!rig.hw.pump_on);
}

#[test]
fn missing_rtc_falls_back_to_build_time() {
    let clock = MockClock {
        rtc_running: false,
        ..MockClock::at(0)
    };
    let rig = Rig::boot_with(MemStorage::new(), clock);

    assert!(rig.sink.contains(&AppEvent::ClockFallback));
    assert_eq!(rig.app.state(), StateId::Idle);
}

// ── Dosing ────────────────────────────────────────────────────

#[test]
fn normal_dose_delivers_one_portion() {
    let mut rig = Rig::boot_at(0);

    assert_eq!(rig.run_until_pump_starts(900_000, STEP), Some(FIRST_START));
    assert_eq!(rig.app.state(), StateId::Pumping);

    rig.run_until(900_000, STEP);
    assert!(rig.hw.pump_on, "run time not yet exceeded");

    rig.run_until(901_000, STEP);
    assert!(!rig.hw.pump_on);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.sink.contains(&AppEvent::CycleCompleted(CycleReport {
        delivered_ml: 100,
        pumped_ms: 87_000,
        truncated: false,
    })));
    assert_eq!(rig.app.statistics().today_ml(), 100);
    assert_eq!(rig.app.statistics().pumped_total_ml, 100);
}

#[test]
fn doses_repeat_every_period() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(2_000_000, STEP);
    // Starts at 814 000 and 1 715 000.
    assert_eq!(rig.hw.pump_starts, 2);
    assert_eq!(rig.app.statistics().today_ml(), 200);
}

// ── Interlocks ────────────────────────────────────────────────

#[test]
fn force_stop_mid_pump_blocks_for_an_hour() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(850_000, STEP);
    assert!(rig.hw.pump_on);

    // Held on the tick at 851 000.
    rig.press(Button::ForceStop, STEP);
    assert!(!rig.hw.pump_on);
    assert!(rig.sink.contains(&AppEvent::ForceStopRequested));
    assert!(rig.sink.contains(&AppEvent::InterlockArmed(InterlockChannel::ForceStop)));
    assert!(rig.sink.contains(&AppEvent::CycleCompleted(CycleReport {
        delivered_ml: 42,
        pumped_ms: 37_000,
        truncated: true,
    })));
    assert_eq!(rig.app.statistics().today_ml(), 42);

    assert_eq!(rig.run_until_pump_starts(851_000 + ONE_HOUR, STEP), None);
    assert!(rig.sink.contains(&AppEvent::InterlockCleared(InterlockChannel::ForceStop)));

    // Windows restart at 1 665 000, 2 479 000, 3 293 000 and 4 107 000;
    // the next one is clear.
    assert_eq!(rig.run_until_pump_starts(5_000_000, STEP), Some(4_921_000));
}

#[test]
fn wet_latch_skips_doses_until_an_hour_after_rearm() {
    let mut rig = Rig::boot_at(0);

    rig.hw.water = true;
    rig.run_until(1_000, STEP);
    assert!(rig.app.seen_wet());
    rig.hw.water = false;

    // The latch holds until the idle window elapses at 814 000, keeping
    // the wet cooldown fresh; it is re-armed there.
    rig.run_until(FIRST_START, STEP);
    assert!(!rig.app.seen_wet());
    assert_eq!(rig.hw.pump_starts, 0);

    assert_eq!(rig.run_until_pump_starts(FIRST_START + ONE_HOUR, STEP), None);
    assert_eq!(rig.run_until_pump_starts(5_000_000, STEP), Some(4_884_000));
    assert_eq!(rig.sink.count(&AppEvent::IdleWindowRestarted), 5);
}

#[test]
fn water_while_pumping_cuts_the_cycle_short() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(820_000, STEP);
    assert!(rig.hw.pump_on);

    rig.hw.water = true;
    rig.run_until(821_000, STEP);

    assert!(!rig.hw.pump_on);
    assert!(rig.sink.contains(&AppEvent::CycleCompleted(CycleReport {
        delivered_ml: 8,
        pumped_ms: 7_000,
        truncated: true,
    })));
    assert!(rig.sink.contains(&AppEvent::InterlockArmed(InterlockChannel::Wet)));
}

#[test]
fn motion_blocks_for_fifteen_minutes() {
    let mut rig = Rig::boot_at(0);

    rig.hw.motion = true;
    rig.run_until(1_000, STEP);
    rig.hw.motion = false;

    // The window ends at 814 000 inside the cooldown (until 901 000) and
    // restarts; the next one pumps.
    assert_eq!(rig.run_until_pump_starts(1_700_000, STEP), Some(1_628_000));
    assert!(rig.sink.contains(&AppEvent::InterlockCleared(InterlockChannel::MotionStop)));
}

// ── Statistics ────────────────────────────────────────────────

#[test]
fn day_rollover_happens_once_at_midnight() {
    // Internal zero is 03:40 on the 12th; midnight is 20 h 20 min later.
    let midnight = 73_200_000;
    let start = midnight - 5_000;
    let mut record = record_at(start, 12);
    record.statistics[0] = 300;

    let mut rig = Rig::boot_with(MemStorage::with_record(&record), MockClock::at(start));
    assert!(rig.sink.contains(&AppEvent::LedgerRestored));

    rig.run_until(10_000, STEP);
    assert_eq!(rig.sink.count(&AppEvent::DayRolledOver { day: 13 }), 1);
    assert_eq!(rig.app.statistics().today_ml(), 0);
    assert_eq!(rig.app.statistics().yesterday_ml(), 300);
}

#[test]
fn multi_day_gap_rolls_over_once() {
    let mut record = record_at(0, 12);
    record.statistics[0] = 300;
    record.statistics[1] = 200;

    let three_days = 3 * 86_400_000;
    let mut rig = Rig::boot_with(MemStorage::with_record(&record), MockClock::at(three_days));
    rig.run_until(5_000, STEP);

    let rolls = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::DayRolledOver { .. }))
        .count();
    assert_eq!(rolls, 1);
    let slots = rig.app.statistics().slots;
    assert_eq!(&slots[..3], &[0, 300, 200]);
}

#[test]
fn container_reset_keeps_history() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(901_000, STEP);

    rig.press(Button::ResetContainer, STEP);
    assert!(rig.sink.contains(&AppEvent::ContainerReset));
    assert_eq!(rig.app.statistics().pumped_total_ml, 0);
    assert_eq!(rig.app.statistics().today_ml(), 100);
}

#[test]
fn factory_reset_wipes_statistics_and_ledger() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(901_000, STEP);
    assert_eq!(rig.app.statistics().pumped_total_ml, 100);

    rig.press(Button::FactoryReset, STEP);
    assert!(rig.sink.contains(&AppEvent::FactoryReset));
    assert_eq!(rig.app.statistics().pumped_total_ml, 0);
    assert_eq!(rig.app.statistics().today_ml(), 0);

    let mut reread = plantwater::ledger::Ledger::new(rig.ledger.storage().clone());
    let stored = reread.load().unwrap();
    assert_eq!(stored.pumped_total_ml, 0);
    assert_eq!(stored.statistics, [0; 24]);
}

#[test]
fn force_stop_survives_factory_reset_on_the_same_tick() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(850_000, STEP);
    assert!(rig.hw.pump_on);

    rig.press_together(&[Button::ForceStop, Button::FactoryReset], STEP);
    assert!(!rig.hw.pump_on);
    assert!(rig.sink.contains(&AppEvent::FactoryReset));
    assert_eq!(rig.app.statistics().pumped_total_ml, 0);
    assert!(
        rig.app
            .interlock()
            .is_active(InterlockChannel::ForceStop, rig.app.now_ms())
    );

    // The stop holds for the full hour after the reset.
    assert_eq!(rig.run_until_pump_starts(851_000 + ONE_HOUR, STEP), None);
}

// ── Time ──────────────────────────────────────────────────────

#[test]
fn drift_correction_waits_for_idle() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(1_800_000, STEP);
    // The RTC gains 5 s on the monotonic counter.
    rig.clock.wall_base += 5_000;

    // Due after 3 600 000, but the fourth dose runs 3 517 000..3 604 000.
    rig.run_until(3_604_000, STEP);
    assert!(
        !rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::ClockCorrected { .. }))
    );

    rig.run_until(3_605_000, STEP);
    assert_eq!(rig.sink.count(&AppEvent::ClockCorrected { delta_ms: 5_000 }), 1);
    assert_eq!(rig.app.now_ms(), 3_610_000);
    assert_eq!(rig.app.last_hour_started_ms(), 3_610_000);
}

// ── Presentation ──────────────────────────────────────────────

#[test]
fn low_water_alarm_pulses() {
    let mut record = record_at(0, 12);
    record.pumped_total_ml = 27_900;
    let mut rig = Rig::boot_with(MemStorage::with_record(&record), MockClock::at(0));

    rig.run_until(50, 50);
    let frame = rig.frame();
    assert_eq!(frame.alarm, 50);
    assert!(frame.line2.starts_with(" 0% "), "got {:?}", frame.line2);

    rig.run_until(5_000, 50);
    assert_eq!(rig.frame().alarm, 0);

    // Pulse phase again, but a force stop silences it.
    rig.run_until(19_950, 50);
    rig.press(Button::ForceStop, 50);
    assert_eq!(rig.app.now_ms() % 10_000, 50);
    assert_eq!(rig.frame().alarm, 0);
}

#[test]
fn backlight_button_toggles_and_sounds() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(5_000, STEP);

    rig.hw.buttons = plantwater::drivers::button::ButtonSet::EMPTY.with(Button::Backlight);
    rig.run_until(6_000, STEP);
    assert_eq!(rig.frame().alarm, 50);
    assert!(rig.app.backlight_on());

    rig.hw.buttons = plantwater::drivers::button::ButtonSet::EMPTY;
    rig.run_until(7_000, STEP);
    rig.press(Button::Backlight, STEP);
    assert!(!rig.app.backlight_on());
    assert!(rig.sink.contains(&AppEvent::BacklightToggled(true)));
    assert!(rig.sink.contains(&AppEvent::BacklightToggled(false)));
}
