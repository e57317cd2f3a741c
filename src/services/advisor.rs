//! Rule-based farm-health advisory engine.
//!
//! Evaluates the most recent soil reading against fixed agronomic thresholds
//! and emits a list of advisory messages. The engine is a pure function of the
//! reading so the thresholds can be tested without a repository.

use crate::models::{AdviceSeverity, FarmAdvice, SoilReading};

// Agronomic thresholds. Moisture is a percentage, nutrient levels are ppm.
const MOISTURE_LOW: f64 = 40.0;
const MOISTURE_HIGH: f64 = 80.0;
const PH_VERY_ACIDIC: f64 = 5.5;
const PH_SLIGHTLY_ACIDIC: f64 = 6.0;
const PH_ALKALINE: f64 = 7.5;
const NITROGEN_LOW_PPM: f64 = 50.0;
const PHOSPHORUS_LOW_PPM: f64 = 20.0;
const POTASSIUM_LOW_PPM: f64 = 100.0;

/// Produce advisory messages for the given latest soil reading.
///
/// With no reading at all, a single informational message asks for data.
/// Afterwards, if the list is empty or holds exactly one informational
/// message, a general "all good" message is appended.
pub fn farm_health_advice(latest: Option<&SoilReading>) -> Vec<FarmAdvice> {
    let mut advice = Vec::new();

    match latest {
        None => {
            advice.push(FarmAdvice::info(
                "No soil readings available. Please add some to get soil health advice.",
            ));
        }
        Some(reading) => {
            evaluate_moisture(reading.soil_moisture_percentage, &mut advice);
            evaluate_ph(reading.ph_level, &mut advice);
            evaluate_nutrients(reading, &mut advice);
        }
    }

    let only_info = advice.len() == 1 && advice[0].severity == AdviceSeverity::Info;
    if advice.is_empty() || only_info {
        advice.push(FarmAdvice::success(
            "Farm health appears good based on available data!",
        ));
    }

    advice
}

fn evaluate_moisture(moisture: Option<f64>, advice: &mut Vec<FarmAdvice>) {
    match moisture {
        Some(m) if m < MOISTURE_LOW => advice.push(FarmAdvice::warning(format!(
            "Soil moisture is low ({}%). Consider immediate irrigation.",
            m
        ))),
        Some(m) if m > MOISTURE_HIGH => advice.push(FarmAdvice::info(format!(
            "Soil moisture is high ({}%). Ensure proper drainage to avoid root rot.",
            m
        ))),
        Some(m) => advice.push(FarmAdvice::success(format!(
            "Soil moisture is optimal ({}%).",
            m
        ))),
        None => advice.push(FarmAdvice::info(
            "Soil moisture data is missing from the latest reading.",
        )),
    }
}

fn evaluate_ph(ph: Option<f64>, advice: &mut Vec<FarmAdvice>) {
    match ph {
        Some(p) if p < PH_VERY_ACIDIC => advice.push(FarmAdvice::warning(format!(
            "Soil pH is very acidic ({}). Consider liming to raise pH.",
            p
        ))),
        Some(p) if p < PH_SLIGHTLY_ACIDIC => advice.push(FarmAdvice::info(format!(
            "Soil pH is slightly acidic ({}). Monitor and consider small adjustments.",
            p
        ))),
        Some(p) if p > PH_ALKALINE => advice.push(FarmAdvice::warning(format!(
            "Soil pH is alkaline ({}). Consider amendments to lower pH.",
            p
        ))),
        Some(p) => advice.push(FarmAdvice::success(format!("Soil pH is optimal ({}).", p))),
        None => advice.push(FarmAdvice::info(
            "Soil pH data is missing from the latest reading.",
        )),
    }
}

fn evaluate_nutrients(reading: &SoilReading, advice: &mut Vec<FarmAdvice>) {
    match reading.nitrogen_level_ppm {
        Some(n) if n < NITROGEN_LOW_PPM => advice.push(FarmAdvice::warning(format!(
            "Nitrogen level is low ({} ppm). Consider nitrogen-rich fertilizer.",
            n
        ))),
        Some(_) => {}
        None => advice.push(FarmAdvice::info(
            "Nitrogen data is missing from the latest reading.",
        )),
    }

    match reading.phosphorus_level_ppm {
        Some(p) if p < PHOSPHORUS_LOW_PPM => advice.push(FarmAdvice::warning(format!(
            "Phosphorus level is low ({} ppm). Consider phosphorus-rich fertilizer.",
            p
        ))),
        Some(_) => {}
        None => advice.push(FarmAdvice::info(
            "Phosphorus data is missing from the latest reading.",
        )),
    }

    match reading.potassium_level_ppm {
        Some(k) if k < POTASSIUM_LOW_PPM => advice.push(FarmAdvice::warning(format!(
            "Potassium level is low ({} ppm). Consider potassium-rich fertilizer.",
            k
        ))),
        Some(_) => {}
        None => advice.push(FarmAdvice::info(
            "Potassium data is missing from the latest reading.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(
        moisture: Option<f64>,
        ph: Option<f64>,
        n: Option<f64>,
        p: Option<f64>,
        k: Option<f64>,
    ) -> SoilReading {
        SoilReading {
            reading_id: 1,
            crop_id: None,
            crop_name: None,
            reading_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            soil_moisture_percentage: moisture,
            ph_level: ph,
            nitrogen_level_ppm: n,
            phosphorus_level_ppm: p,
            potassium_level_ppm: k,
            notes: None,
        }
    }

    #[test]
    fn no_reading_yields_info_then_fallback_success() {
        let advice = farm_health_advice(None);
        assert_eq!(advice.len(), 2);
        assert_eq!(advice[0].severity, AdviceSeverity::Info);
        assert!(advice[0].message.contains("No soil readings available"));
        assert_eq!(advice[1].severity, AdviceSeverity::Success);
    }

    #[test]
    fn everything_deficient_yields_five_warnings_in_order() {
        let r = reading(
            Some(10.0),
            Some(4.5),
            Some(10.0),
            Some(5.0),
            Some(50.0),
        );
        let advice = farm_health_advice(Some(&r));
        assert_eq!(advice.len(), 5);
        assert!(advice
            .iter()
            .all(|a| a.severity == AdviceSeverity::Warning));
        assert!(advice[0].message.contains("moisture is low"));
        assert!(advice[1].message.contains("very acidic"));
        assert!(advice[2].message.contains("Nitrogen level is low"));
        assert!(advice[3].message.contains("Phosphorus level is low"));
        assert!(advice[4].message.contains("Potassium level is low"));
    }

    #[test]
    fn healthy_reading_emits_successes_without_fallback() {
        // Healthy nutrients are silent; moisture and pH each emit a success.
        // Two successes do not trigger the trailing general message.
        let r = reading(
            Some(55.0),
            Some(6.8),
            Some(80.0),
            Some(30.0),
            Some(150.0),
        );
        let advice = farm_health_advice(Some(&r));
        assert_eq!(advice.len(), 2);
        assert!(advice
            .iter()
            .all(|a| a.severity == AdviceSeverity::Success));
    }

    #[test]
    fn ph_band_boundaries() {
        let acidic = reading(Some(55.0), Some(5.4), Some(80.0), Some(30.0), Some(150.0));
        assert!(farm_health_advice(Some(&acidic))[1]
            .message
            .contains("very acidic"));

        let slightly = reading(Some(55.0), Some(5.7), Some(80.0), Some(30.0), Some(150.0));
        let advice = farm_health_advice(Some(&slightly));
        assert_eq!(advice[1].severity, AdviceSeverity::Info);
        assert!(advice[1].message.contains("slightly acidic"));

        let alkaline = reading(Some(55.0), Some(8.0), Some(80.0), Some(30.0), Some(150.0));
        assert!(farm_health_advice(Some(&alkaline))[1]
            .message
            .contains("alkaline"));

        // 7.5 exactly sits inside the optimal band.
        let edge = reading(Some(55.0), Some(7.5), Some(80.0), Some(30.0), Some(150.0));
        assert_eq!(
            farm_health_advice(Some(&edge))[1].severity,
            AdviceSeverity::Success
        );
    }

    #[test]
    fn all_null_parameters_yield_infos_plus_no_fallback() {
        // Five info messages: the fallback only fires for exactly one info.
        let r = reading(None, None, None, None, None);
        let advice = farm_health_advice(Some(&r));
        assert_eq!(advice.len(), 5);
        assert!(advice.iter().all(|a| a.severity == AdviceSeverity::Info));
        assert!(advice
            .iter()
            .all(|a| a.message.contains("missing from the latest reading")));
    }

    #[test]
    fn two_infos_do_not_trigger_fallback() {
        // High moisture and missing pH are both informational; the general
        // message only fires for exactly one info.
        let r = reading(Some(85.0), None, Some(80.0), Some(30.0), Some(150.0));
        let advice = farm_health_advice(Some(&r));
        assert_eq!(advice.len(), 2);
        assert!(advice.iter().all(|a| a.severity == AdviceSeverity::Info));
    }
}
