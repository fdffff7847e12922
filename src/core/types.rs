use serde::{Deserialize, Serialize};

use super::error::ValuationError;

/// Longest explicit projection horizon accepted, in years.
pub const MAX_GROWTH_PERIOD_YEARS: u32 = 100;

/// Unit shared by every monetary input and output of one valuation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonetaryUnit {
    /// 1 unit = 10,000,000 base currency units.
    #[default]
    Crore,
    Absolute,
}

impl MonetaryUnit {
    /// Base currency units per one unit of this kind.
    pub const fn base_units(self) -> f64 {
        match self {
            MonetaryUnit::Crore => 10_000_000.0,
            MonetaryUnit::Absolute => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationInputs {
    pub unit: MonetaryUnit,
    pub current_revenue: f64,
    pub current_ebit: f64,
    pub tax_rate: f64,
    pub cash_and_equivalents: f64,
    pub total_debt: f64,
    pub growth_period_years: u32,
    pub revenue_growth_rate: f64,
    pub terminal_growth_rate: f64,
    pub target_operating_margin: f64,
    pub sales_to_capital_ratio: f64,
    pub risk_free_rate: f64,
    pub beta: f64,
    pub equity_risk_premium: f64,
    pub cost_of_debt: f64,
    pub debt_to_capital_ratio: f64,
    /// Absolute share count, never rescaled.
    pub shares_outstanding: f64,
}

impl ValuationInputs {
    /// Rejects inputs the engine cannot value meaningfully. The service runs
    /// it while preparing a request, and `calculate` runs it again first.
    pub fn validate(&self) -> Result<(), ValuationError> {
        for (field, value) in [
            ("current_revenue", self.current_revenue),
            ("current_ebit", self.current_ebit),
            ("tax_rate", self.tax_rate),
            ("cash_and_equivalents", self.cash_and_equivalents),
            ("total_debt", self.total_debt),
            ("revenue_growth_rate", self.revenue_growth_rate),
            ("terminal_growth_rate", self.terminal_growth_rate),
            ("target_operating_margin", self.target_operating_margin),
            ("sales_to_capital_ratio", self.sales_to_capital_ratio),
            ("risk_free_rate", self.risk_free_rate),
            ("beta", self.beta),
            ("equity_risk_premium", self.equity_risk_premium),
            ("cost_of_debt", self.cost_of_debt),
            ("debt_to_capital_ratio", self.debt_to_capital_ratio),
            ("shares_outstanding", self.shares_outstanding),
        ] {
            if !value.is_finite() {
                return Err(ValuationError::invalid(field, "must be finite"));
            }
        }

        if self.current_revenue < 0.0 {
            return Err(ValuationError::invalid("current_revenue", "must be >= 0"));
        }

        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(ValuationError::invalid(
                "tax_rate",
                "must be between 0 and 1",
            ));
        }

        if self.cash_and_equivalents < 0.0 {
            return Err(ValuationError::invalid(
                "cash_and_equivalents",
                "must be >= 0",
            ));
        }

        if self.total_debt < 0.0 {
            return Err(ValuationError::invalid("total_debt", "must be >= 0"));
        }

        if self.growth_period_years == 0 {
            return Err(ValuationError::invalid(
                "growth_period_years",
                "must be > 0",
            ));
        }

        if self.growth_period_years > MAX_GROWTH_PERIOD_YEARS {
            return Err(ValuationError::invalid(
                "growth_period_years",
                format!("must be <= {MAX_GROWTH_PERIOD_YEARS}"),
            ));
        }

        if self.revenue_growth_rate <= -1.0 {
            return Err(ValuationError::invalid(
                "revenue_growth_rate",
                "must be > -1",
            ));
        }

        if self.sales_to_capital_ratio <= 0.0 {
            return Err(ValuationError::invalid(
                "sales_to_capital_ratio",
                "must be > 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.debt_to_capital_ratio) {
            return Err(ValuationError::invalid(
                "debt_to_capital_ratio",
                "must be between 0 and 1",
            ));
        }

        if self.shares_outstanding <= 0.0 {
            return Err(ValuationError::invalid(
                "shares_outstanding",
                "must be > 0",
            ));
        }

        Ok(())
    }

    /// Operating margin of the un-projected base year.
    pub fn current_margin(&self) -> f64 {
        if self.current_revenue != 0.0 {
            self.current_ebit / self.current_revenue
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearProjection {
    pub year: u32,
    pub revenue: f64,
    pub ebit: f64,
    pub nopat: f64,
    pub reinvestment: f64,
    pub fcff: f64,
    pub discount_factor: f64,
    pub present_value_fcff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub projections: Vec<YearProjection>,
    pub terminal_value: f64,
    pub present_value_terminal_value: f64,
    pub sum_pv_fcff: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    /// Base currency per share, whatever the monetary unit.
    pub share_price: f64,
    pub wacc: f64,
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> ValuationInputs {
    ValuationInputs {
        unit: MonetaryUnit::Crore,
        current_revenue: 1_000.0,
        current_ebit: 150.0,
        tax_rate: 0.25,
        cash_and_equivalents: 50.0,
        total_debt: 100.0,
        growth_period_years: 10,
        revenue_growth_rate: 0.12,
        terminal_growth_rate: 0.05,
        target_operating_margin: 0.20,
        sales_to_capital_ratio: 1.5,
        risk_free_rate: 0.072,
        beta: 1.0,
        equity_risk_premium: 0.07,
        cost_of_debt: 0.09,
        debt_to_capital_ratio: 0.20,
        shares_outstanding: 50_000_000.0,
    }
}
