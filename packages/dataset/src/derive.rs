//! Columns computed once at load time.

use pricing_map_models::{Derived, Holdings};

/// Lowest adjusted insalubrity score shown on the dashboard.
pub const INSALUBRITY_FLOOR: f64 = 1.0;

/// Computes the derived value columns from a row's holdings.
#[must_use]
pub fn derive(holdings: &Holdings) -> Derived {
    Derived {
        valor_medio: f64::midpoint(holdings.valor_mun_perim, holdings.valor_mun_area),
        valor_medio_car: area_value_per_property(holdings),
        val_med_car_perim: per_property(holdings.valor_mun_perim, holdings.num_imoveis),
    }
}

/// Raises `score` to [`INSALUBRITY_FLOOR`] when below it.
#[must_use]
pub fn floor_insalubrity(score: f64) -> f64 {
    if score.is_nan() || score < INSALUBRITY_FLOOR {
        INSALUBRITY_FLOOR
    } else {
        score
    }
}

/// Share of the area-priced total that falls on CAR properties, split
/// evenly among them.
fn area_value_per_property(holdings: &Holdings) -> f64 {
    if holdings.area_car_total == 0.0 {
        return 0.0;
    }
    let car_share = per_property(holdings.area_car_total, holdings.area_georef);
    per_property(car_share * holdings.valor_mun_area, holdings.num_imoveis)
}

/// `numerator / divisor`, or 0 when the divisor is 0 or the quotient is
/// not a finite, non-negative number.
fn per_property(numerator: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        return 0.0;
    }
    let quotient = numerator / divisor;
    if quotient.is_finite() {
        quotient.max(0.0)
    } else {
        0.0
    }
}
