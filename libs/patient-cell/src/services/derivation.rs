//! BMI and verdict derivation.
//!
//! Pure functions of height and weight. Nothing here is cached: callers
//! recompute from the record's current measurements every time.

use crate::models::Verdict;

/// `weight / height²`, rounded to two decimal places.
///
/// Rounding is half-away-from-zero on the value scaled by 100.
pub fn compute_bmi(height: f64, weight: f64) -> f64 {
    let bmi = weight / (height * height);
    (bmi * 100.0).round() / 100.0
}

/// Maps a BMI to its verdict. Thresholds are evaluated in order and the first
/// match wins, so `24.9 <= bmi < 25` lands on `Obesity`.
pub fn classify(bmi: f64) -> Verdict {
    if bmi < 18.5 {
        Verdict::Underweight
    } else if bmi < 24.9 {
        Verdict::NormalWeight
    } else if (25.0..29.9).contains(&bmi) {
        Verdict::Overweight
    } else {
        Verdict::Obesity
    }
}
