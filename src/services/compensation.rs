// src/services/compensation.rs

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::staff::EmploymentCostBreakdown;

// On-cost rates, in percent of the base hourly wage.
const SUPERANNUATION_PCT: Decimal = Decimal::from_parts(115, 0, 0, false, 1);
const WORKERS_COMP_PCT: Decimal = Decimal::from_parts(65, 0, 0, false, 1);
const ANNUAL_LEAVE_PCT: Decimal = Decimal::from_parts(105, 0, 0, false, 1);
const SICK_LEAVE_PCT: Decimal = Decimal::from_parts(51, 0, 0, false, 1);
const PUBLIC_HOLIDAYS_PCT: Decimal = Decimal::from_parts(42, 0, 0, false, 1);
const LONG_SERVICE_PCT: Decimal = Decimal::from_parts(17, 0, 0, false, 1);
const OVERHEAD_PCT: Decimal = Decimal::from_parts(10, 0, 0, false, 1);

// Flat per-hour allowances, in dollars.
const TOOL_ALLOWANCE: Decimal = Decimal::from_parts(250, 0, 0, false, 2);
const TRAINING_ALLOWANCE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// Multiplier used for quick quoting when none is stored for the staff member.
pub const DEFAULT_COST_MULTIPLIER: Decimal = Decimal::from_parts(145, 0, 0, false, 2);

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn pct_of(base: Decimal, pct: Decimal) -> Decimal {
    money(base * pct / Decimal::ONE_HUNDRED)
}

/// Full hourly employment cost for a base wage.
pub fn employment_cost(hourly_rate: Decimal) -> EmploymentCostBreakdown {
    let superannuation = pct_of(hourly_rate, SUPERANNUATION_PCT);
    let workers_comp = pct_of(hourly_rate, WORKERS_COMP_PCT);
    let annual_leave = pct_of(hourly_rate, ANNUAL_LEAVE_PCT);
    let sick_leave = pct_of(hourly_rate, SICK_LEAVE_PCT);
    let public_holidays = pct_of(hourly_rate, PUBLIC_HOLIDAYS_PCT);
    let long_service_leave = pct_of(hourly_rate, LONG_SERVICE_PCT);
    let overhead = pct_of(hourly_rate, OVERHEAD_PCT);

    let total_cost = hourly_rate
        + superannuation
        + workers_comp
        + annual_leave
        + sick_leave
        + public_holidays
        + long_service_leave
        + TOOL_ALLOWANCE
        + TRAINING_ALLOWANCE
        + overhead;

    let cost_multiplier = if hourly_rate.is_zero() {
        Decimal::ZERO
    } else {
        (total_cost / hourly_rate).round_dp(3)
    };

    EmploymentCostBreakdown {
        base_wage: hourly_rate,
        superannuation,
        workers_comp,
        annual_leave,
        sick_leave,
        public_holidays,
        long_service_leave,
        tool_allowance: TOOL_ALLOWANCE,
        training: TRAINING_ALLOWANCE,
        overhead,
        total_cost,
        cost_multiplier,
    }
}

pub fn quick_true_cost(hourly_rate: Decimal, multiplier: Option<Decimal>) -> Decimal {
    money(hourly_rate * multiplier.unwrap_or(DEFAULT_COST_MULTIPLIER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn breakdown_for_a_40_dollar_rate() {
        let cost = employment_cost(dec("40.00"));

        assert_eq!(cost.superannuation, dec("4.60"));
        assert_eq!(cost.workers_comp, dec("2.60"));
        assert_eq!(cost.annual_leave, dec("4.20"));
        assert_eq!(cost.sick_leave, dec("2.04"));
        assert_eq!(cost.public_holidays, dec("1.68"));
        assert_eq!(cost.long_service_leave, dec("0.68"));
        assert_eq!(cost.tool_allowance, dec("2.50"));
        assert_eq!(cost.training, dec("0.50"));
        assert_eq!(cost.overhead, dec("0.40"));
        assert_eq!(cost.total_cost, dec("59.20"));
        assert_eq!(cost.cost_multiplier, dec("1.48"));
    }

    #[test]
    fn zero_rate_has_no_multiplier() {
        let cost = employment_cost(Decimal::ZERO);
        assert_eq!(cost.total_cost, dec("3.00"));
        assert_eq!(cost.cost_multiplier, Decimal::ZERO);
    }

    #[test]
    fn quick_cost_falls_back_to_default_multiplier() {
        assert_eq!(quick_true_cost(dec("40"), None), dec("58.00"));
        assert_eq!(quick_true_cost(dec("40"), Some(dec("1.5"))), dec("60.00"));
    }
}
