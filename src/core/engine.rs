use super::error::ValuationError;
use super::types::{ValuationInputs, ValuationResult, YearProjection};

pub fn calculate(inputs: &ValuationInputs) -> Result<ValuationResult, ValuationError> {
    inputs.validate()?;

    let wacc = finite("wacc", weighted_average_cost_of_capital(inputs))?;
    let projections = project_years(inputs, wacc)?;

    let mut sum_pv_fcff = 0.0;
    for projection in &projections {
        sum_pv_fcff += projection.present_value_fcff;
    }
    let sum_pv_fcff = finite("sum_pv_fcff", sum_pv_fcff)?;

    let final_revenue = projections
        .last()
        .map(|p| p.revenue)
        .unwrap_or(inputs.current_revenue);
    let terminal_value = terminal_value(inputs, final_revenue, wacc)?;
    let present_value_terminal_value = finite(
        "present_value_terminal_value",
        terminal_value / growth_factor(wacc, inputs.growth_period_years),
    )?;

    let enterprise_value = finite(
        "enterprise_value",
        sum_pv_fcff + present_value_terminal_value,
    )?;
    let equity_value = finite(
        "equity_value",
        enterprise_value + inputs.cash_and_equivalents - inputs.total_debt,
    )?;
    let share_price = finite(
        "share_price",
        equity_value * inputs.unit.base_units() / inputs.shares_outstanding,
    )?;

    Ok(ValuationResult {
        projections,
        terminal_value,
        present_value_terminal_value,
        sum_pv_fcff,
        enterprise_value,
        equity_value,
        share_price,
        wacc,
    })
}

pub fn weighted_average_cost_of_capital(inputs: &ValuationInputs) -> f64 {
    let cost_of_equity = inputs.risk_free_rate + inputs.beta * inputs.equity_risk_premium;
    let after_tax_cost_of_debt = inputs.cost_of_debt * (1.0 - inputs.tax_rate);
    cost_of_equity * (1.0 - inputs.debt_to_capital_ratio)
        + after_tax_cost_of_debt * inputs.debt_to_capital_ratio
}

/// Linear path from `current_margin` to `target_margin`, landing on the
/// target exactly in the final year of the horizon.
pub fn margin_for_year(current_margin: f64, target_margin: f64, year: u32, horizon: u32) -> f64 {
    if year >= horizon {
        return target_margin;
    }
    let progress = f64::from(year) / f64::from(horizon);
    current_margin + (target_margin - current_margin) * progress
}

fn project_years(
    inputs: &ValuationInputs,
    wacc: f64,
) -> Result<Vec<YearProjection>, ValuationError> {
    let horizon = inputs.growth_period_years;
    let current_margin = inputs.current_margin();
    let mut projections = Vec::with_capacity(horizon as usize);

    // Prior revenue is carried forward rather than back-derived from the
    // growth rate, so a per-year growth schedule can slot in here.
    let mut previous_revenue = inputs.current_revenue;
    for year in 1..=horizon {
        let revenue = finite(
            "revenue",
            previous_revenue * (1.0 + inputs.revenue_growth_rate),
        )?;
        let margin = margin_for_year(
            current_margin,
            inputs.target_operating_margin,
            year,
            horizon,
        );
        let ebit = finite("ebit", revenue * margin)?;
        let nopat = ebit * (1.0 - inputs.tax_rate);
        let reinvestment = finite(
            "reinvestment",
            (revenue - previous_revenue) / inputs.sales_to_capital_ratio,
        )?;
        let fcff = finite("fcff", nopat - reinvestment)?;
        let discount_factor = finite("discount_factor", 1.0 / growth_factor(wacc, year))?;
        let present_value_fcff = finite("present_value_fcff", fcff * discount_factor)?;

        projections.push(YearProjection {
            year,
            revenue,
            ebit,
            nopat,
            reinvestment,
            fcff,
            discount_factor,
            present_value_fcff,
        });
        previous_revenue = revenue;
    }

    Ok(projections)
}

/// Perpetuity value at the end of the horizon, built from the first
/// post-horizon year at the fully converged margin.
fn terminal_value(
    inputs: &ValuationInputs,
    final_revenue: f64,
    wacc: f64,
) -> Result<f64, ValuationError> {
    let spread = wacc - inputs.terminal_growth_rate;
    if spread == 0.0 {
        return Err(ValuationError::TerminalValueUndefined {
            wacc,
            terminal_growth_rate: inputs.terminal_growth_rate,
        });
    }

    let next_revenue = final_revenue * (1.0 + inputs.terminal_growth_rate);
    let next_ebit = next_revenue * inputs.target_operating_margin;
    let next_nopat = next_ebit * (1.0 - inputs.tax_rate);
    let next_reinvestment = (next_revenue - final_revenue) / inputs.sales_to_capital_ratio;
    let next_fcff = finite("terminal_fcff", next_nopat - next_reinvestment)?;

    // A negative spread yields a negative value; it is returned as computed.
    finite("terminal_value", next_fcff / spread)
}

fn growth_factor(rate: f64, years: u32) -> f64 {
    (1.0 + rate).powf(f64::from(years))
}

fn finite(quantity: &'static str, value: f64) -> Result<f64, ValuationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValuationError::NonFiniteResult { quantity })
    }
}
