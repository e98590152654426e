//! Dosing plan — the fixed timing parameters of the pump scheduler.
//!
//! The controller doses a fixed `pump_portion_ml` once per `period_ms`.
//! The pump has no flow sensor, so volume and run time are converted
//! through the measured pump throughput:
//!
//! ```text
//!   ┌──────────── period_ms ────────────┐
//!   │ pump_duration │   idle_duration   │
//!   └───────────────┴───────────────────┘
//!     ml_to_ms(portion)   period − pump
//! ```
//!
//! ## Rounding
//!
//! Both conversions truncate toward zero.  Each cycle therefore
//! under-reports by strictly less than 1 mL; short cycles cut off by an
//! interlock truncate the same way.  The remainder is not carried forward.

use crate::config::SystemConfig;

/// Convert a volume to the pump run time that delivers it.
///
/// `100_000 · ml / flow`, truncated.  `flow` is mL per 100 s and must be
/// non-zero (enforced by config validation; clamped to 1 here).
pub fn ml_to_ms(millilitres: u32, flow_ml_per_100s: u16) -> u64 {
    100_000 * u64::from(millilitres) / u64::from(flow_ml_per_100s.max(1))
}

/// Convert a pump run time to the volume it delivered.
///
/// `ms · flow / 100_000`, truncated.
pub fn ms_to_ml(milliseconds: u64, flow_ml_per_100s: u16) -> u32 {
    let ml = u128::from(milliseconds) * u128::from(flow_ml_per_100s) / 100_000;
    u32::try_from(ml).unwrap_or(u32::MAX)
}

/// Pump run / idle window lengths derived from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosingPlan {
    /// Time the pump runs to deliver one portion.
    pub pump_duration_ms: u64,
    /// Idle wait between the end of one cycle and the start of the next.
    pub idle_duration_ms: u64,
    /// Throughput used for every ms → mL conversion.
    pub flow_ml_per_100s: u16,
}

impl DosingPlan {
    pub fn from_config(config: &SystemConfig) -> Self {
        let flow = config.pump_flow_ml_per_100s.max(1);
        let pump_duration_ms = ml_to_ms(u32::from(config.pump_portion_ml), flow);
        Self {
            pump_duration_ms,
            idle_duration_ms: u64::from(config.period_ms).saturating_sub(pump_duration_ms),
            flow_ml_per_100s: flow,
        }
    }

    /// Volume delivered by a pump run of `pumped_ms`, saturated to the
    /// width of a statistics slot.
    pub fn delivered_ml(&self, pumped_ms: u64) -> u16 {
        u16::try_from(ms_to_ml(pumped_ms, self.flow_ml_per_100s)).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_matches_pump_speed() {
        let plan = DosingPlan::from_config(&SystemConfig::default());
        // 100 mL at 116 mL / 100 s
        assert_eq!(plan.pump_duration_ms, 86_206);
        assert_eq!(plan.idle_duration_ms, 900_000 - 86_206);
    }

    #[test]
    fn conversions_truncate() {
        assert_eq!(ms_to_ml(86_206, 116), 99);
        assert_eq!(ms_to_ml(86_207, 116), 100);
        assert_eq!(ms_to_ml(862, 116), 0);
        assert_eq!(ml_to_ms(1, 116), 862);
    }

    #[test]
    fn delivered_saturates_to_slot_width() {
        let plan = DosingPlan::from_config(&SystemConfig::default());
        assert_eq!(plan.delivered_ml(u64::MAX), u16::MAX);
    }

    #[test]
    fn zero_flow_does_not_divide_by_zero() {
        let cfg = SystemConfig {
            pump_flow_ml_per_100s: 0,
            ..Default::default()
        };
        let plan = DosingPlan::from_config(&cfg);
        assert_eq!(plan.flow_ml_per_100s, 1);
        assert_eq!(plan.idle_duration_ms, 0);
    }
}
