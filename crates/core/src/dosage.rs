/// Volume in millilitres to administer for a weight-based dose.
///
/// `weight_kg * dose_mg_per_kg / concentration_mg_per_ml`. Returns `None` unless every input
/// is finite, the concentration is positive and the other two are non-negative.
pub fn dosage_volume_ml(
    weight_kg: f64,
    dose_mg_per_kg: f64,
    concentration_mg_per_ml: f64,
) -> Option<f64> {
    let finite = [weight_kg, dose_mg_per_kg, concentration_mg_per_ml]
        .iter()
        .all(|v| v.is_finite());
    if !finite || concentration_mg_per_ml <= 0.0 || weight_kg < 0.0 || dose_mg_per_kg < 0.0 {
        return None;
    }
    Some(weight_kg * dose_mg_per_kg / concentration_mg_per_ml)
}
