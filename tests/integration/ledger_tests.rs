//! Ledger persistence across reboots, driven through the service.

use crate::mock_hw::{MemStorage, MockClock, Rig, record_at};

use plantwater::app::events::AppEvent;
use plantwater::app::ports::StoragePort;
use plantwater::error::LedgerError;
use plantwater::fsm::StateId;
use plantwater::ledger::Ledger;

const STEP: u64 = 1_000;

/// Reboot on a copy of the rig's storage, `after_ms` later in wall time.
fn reboot(rig: &Rig, after_ms: u64) -> Rig {
    let now = rig.app.now_ms() + after_ms;
    let mut storage = rig.ledger.storage().clone();
    storage.writes = 0;
    Rig::boot_with(storage, MockClock::at(now))
}

#[test]
fn restored_record_matches_what_was_running() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(1_000_000, STEP);
    let before = rig.app.record();

    let rebooted = reboot(&rig, 0);
    assert!(rebooted.sink.contains(&AppEvent::LedgerRestored));
    assert_eq!(rebooted.app.record(), before);
    assert_eq!(rebooted.app.statistics().pumped_total_ml, 100);
}

#[test]
fn restore_does_not_rewrite_storage() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(10_000, STEP);

    let mut rebooted = reboot(&rig, 0);
    rebooted.run_until(10_000, STEP);
    assert_eq!(rebooted.ledger.storage().writes, 0);
}

#[test]
fn state_changes_write_only_changed_fields() {
    let mut rig = Rig::boot_at(0);
    let after_boot = rig.ledger.storage().writes;

    // Pump start: only the pump checkpoint changes.
    rig.run_until(814_000, STEP);
    assert_eq!(rig.app.state(), StateId::Pumping);
    assert_eq!(rig.ledger.storage().writes - after_boot, 1);

    // Pump stop: history, total and idle checkpoint.
    rig.run_until(901_000, STEP);
    assert_eq!(rig.ledger.storage().writes - after_boot, 4);
}

#[test]
fn power_loss_mid_pump_loses_that_run() {
    let mut rig = Rig::boot_at(0);
    rig.run_until(850_000, STEP);
    assert!(rig.hw.pump_on);

    let mut rebooted = reboot(&rig, 5_000);
    assert_eq!(rebooted.app.state(), StateId::Idle);
    assert_eq!(rebooted.app.statistics().pumped_total_ml, 0);

    // The stored idle window has long elapsed, so a full dose starts on
    // the first tick and is the only one recorded.
    rebooted.run_until(1_000, STEP);
    assert!(rebooted.hw.pump_on);
    rebooted.run_until(88_000, STEP);
    assert!(!rebooted.hw.pump_on);
    assert_eq!(rebooted.app.statistics().pumped_total_ml, 100);
}

#[test]
fn wet_cooldown_survives_reboot() {
    let mut rig = Rig::boot_at(0);
    rig.hw.water = true;
    rig.run_until(1_000, STEP);
    rig.hw.water = false;
    // Persisted with the idle-window restart at 814 000.
    rig.run_until(814_000, STEP);

    let rebooted = reboot(&rig, 60_000);
    assert_eq!(rebooted.app.record().last_wet_ms, Some(814_000));
    assert!(!rebooted.app.can_start());
}

#[test]
fn future_checkpoints_are_clamped_on_restore() {
    // RTC set back while powered off: stored times are ahead of now.
    let storage = MemStorage::with_record(&record_at(500_000, 12));
    let rig = Rig::boot_with(storage, MockClock::at(100_000));

    let record = rig.app.record();
    assert_eq!(record.pump_started_ms, 100_000);
    assert_eq!(record.idle_started_ms, 100_000);
    assert_eq!(record.last_hour_started_ms, 100_000);
}

#[test]
fn corrupted_ledger_triggers_full_reset() {
    let mut record = record_at(0, 12);
    record.pumped_total_ml = 5_000;
    let mut storage = MemStorage::with_record(&record);
    storage
        .write(plantwater::ledger::NAMESPACE, "total", &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF])
        .unwrap();

    let rig = Rig::boot_with(storage, MockClock::at(0));
    assert!(rig.sink.contains(&AppEvent::LedgerInitialised));
    assert_eq!(rig.app.statistics().pumped_total_ml, 0);

    let mut reread = Ledger::new(rig.ledger.storage().clone());
    assert_eq!(reread.load().unwrap().pumped_total_ml, 0);
}

#[test]
fn unreadable_storage_runs_on_fresh_state() {
    let mut record = record_at(0, 12);
    record.pumped_total_ml = 5_000;
    let mut storage = MemStorage::with_record(&record);
    storage.fail_reads = true;

    let rig = Rig::boot_with(storage, MockClock::at(0));
    assert!(rig.sink.contains(&AppEvent::LedgerLoadFailed(LedgerError::Storage(
        plantwater::app::ports::StorageError::IoError
    ))));
    assert!(
        !rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::LedgerWriteFailed(_) | AppEvent::LedgerInitialised))
    );
    assert_eq!(rig.app.statistics().pumped_total_ml, 0);
    // Nothing is persisted until the next state change.
    assert_eq!(rig.ledger.storage().writes, 0);
}

#[test]
fn write_failures_are_reported_and_control_continues() {
    let mut rig = Rig::boot_at(0);
    rig.ledger.storage_mut().fail_writes = true;

    rig.run_until(901_000, STEP);
    assert!(
        rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::LedgerWriteFailed(LedgerError::Storage(_))))
    );
    assert_eq!(rig.app.statistics().pumped_total_ml, 100);

    // Storage recovers: the next state change rewrites the full record.
    rig.ledger.storage_mut().fail_writes = false;
    rig.run_until(1_715_000, STEP);
    let mut reread = Ledger::new(rig.ledger.storage().clone());
    assert_eq!(reread.load().unwrap().pumped_total_ml, 100);
}
