//! Purchasable premium plans.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VipPlan {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl VipPlan {
    pub const ALL: [VipPlan; 4] = [
        VipPlan::OneMonth,
        VipPlan::ThreeMonths,
        VipPlan::SixMonths,
        VipPlan::TwelveMonths,
    ];

    /// Callback key used on plan buttons.
    pub fn key(&self) -> &'static str {
        match self {
            VipPlan::OneMonth => "pay_1m",
            VipPlan::ThreeMonths => "pay_3m",
            VipPlan::SixMonths => "pay_6m",
            VipPlan::TwelveMonths => "pay_12m",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|plan| plan.key() == key)
    }

    pub fn days(&self) -> i64 {
        match self {
            VipPlan::OneMonth => 30,
            VipPlan::ThreeMonths => 90,
            VipPlan::SixMonths => 180,
            VipPlan::TwelveMonths => 365,
        }
    }

    /// Price in paise.
    pub fn amount(&self) -> i64 {
        match self {
            VipPlan::OneMonth => 20_000,
            VipPlan::ThreeMonths => 50_000,
            VipPlan::SixMonths => 105_000,
            VipPlan::TwelveMonths => 209_900,
        }
    }

    pub fn amount_rupees(&self) -> i64 {
        self.amount() / 100
    }

    pub fn label(&self) -> &'static str {
        match self {
            VipPlan::OneMonth => "1 Month",
            VipPlan::ThreeMonths => "3 Months",
            VipPlan::SixMonths => "6 Months",
            VipPlan::TwelveMonths => "12 Months",
        }
    }

    /// Plan with exactly this day-count, used to estimate amounts in payment logs.
    pub fn for_days(days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|plan| plan.days() == days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_keys_resolve() {
        assert_eq!(VipPlan::from_key("pay_3m"), Some(VipPlan::ThreeMonths));
        assert_eq!(VipPlan::from_key("pay_2m"), None);
    }

    #[test]
    fn twelve_month_plan_prices_in_rupees() {
        assert_eq!(VipPlan::TwelveMonths.amount_rupees(), 2099);
        assert_eq!(VipPlan::for_days(365), Some(VipPlan::TwelveMonths));
        assert_eq!(VipPlan::for_days(7), None);
    }
}
