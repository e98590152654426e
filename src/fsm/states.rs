//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!            [idle elapsed, latch clear, no interlock]
//!   IDLE ─────────────────────────────────────────────▶ PUMPING
//!    │ ▲                                                   │
//!    │ └──────[run time elapsed OR interlock active]───────┘
//!    │
//!    └─[idle elapsed, latch set OR interlock]─▶ IDLE (window restarts)
//! ```

use super::context::{CycleReport, FsmContext};
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Pumping
        StateDescriptor {
            id: StateId::Pumping,
            name: "Pumping",
            on_enter: Some(pumping_enter),
            on_exit: Some(pumping_exit),
            on_update: pumping_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.idle_elapsed_ms() <= ctx.plan.idle_duration_ms {
        return None;
    }

    if !ctx.seen_wet && !ctx.interlock_active {
        return Some(StateId::Pumping);
    }

    info!(
        "IDLE: skipping dose (wet={}, interlock={}), restarting window",
        ctx.seen_wet, ctx.interlock_active
    );
    ctx.rearm_latch();
    ctx.idle_started_ms = ctx.now_ms;
    ctx.idle_window_restarted = true;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUMPING state
// ═══════════════════════════════════════════════════════════════════════════

fn pumping_enter(ctx: &mut FsmContext) {
    ctx.pump_started_ms = ctx.now_ms;
    ctx.commands.pump_on = true;
    ctx.rearm_latch();
    info!("PUMPING: running for {} ms", ctx.plan.pump_duration_ms);
}

fn pumping_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.interlock_active || ctx.pump_elapsed_ms() > ctx.plan.pump_duration_ms {
        return Some(StateId::Idle);
    }
    None
}

fn pumping_exit(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    let pumped_ms = ctx.pump_elapsed_ms();
    let report = CycleReport {
        delivered_ml: ctx.plan.delivered_ml(pumped_ms),
        pumped_ms,
        truncated: pumped_ms <= ctx.plan.pump_duration_ms,
    };
    info!(
        "PUMPING: stopped after {} ms, {} ml{}",
        pumped_ms,
        report.delivered_ml,
        if report.truncated { " (interlock)" } else { "" }
    );
    ctx.completed_cycle = Some(report);
    ctx.idle_started_ms = ctx.now_ms;
}
