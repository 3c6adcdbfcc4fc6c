use serde::Serialize;

use crate::services::readings::Reading;

const STREET_LIGHT_KWH_PER_DAY: f64 = 0.5;
const PHONE_CHARGE_KWH: f64 = 0.01;
const TV_HOUR_KWH: f64 = 0.1;

/// What a day's harvest could power, in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct EnergyEquivalent {
    pub street_lights: u64,
    pub phone_charges: u64,
    pub tv_hours: u64,
}

impl EnergyEquivalent {
    pub fn from_kwh(energy_kwh: f64) -> Self {
        Self {
            street_lights: whole_units(energy_kwh, STREET_LIGHT_KWH_PER_DAY),
            phone_charges: whole_units(energy_kwh, PHONE_CHARGE_KWH),
            tv_hours: whole_units(energy_kwh, TV_HOUR_KWH),
        }
    }
}

fn whole_units(energy_kwh: f64, per_unit: f64) -> u64 {
    if !energy_kwh.is_finite() || energy_kwh <= 0.0 {
        return 0;
    }
    (energy_kwh / per_unit).floor() as u64
}

/// Public page shown at a sidewalk's QR code.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct EducationPage {
    pub location: String,
    pub city: String,
    pub efficiency_percent: f64,
    pub daily_energy_kwh: f64,
    pub pedestrians_per_day: i64,
    pub equivalent: EnergyEquivalent,
    pub education_text: String,
}

impl EducationPage {
    pub fn new(reading: &Reading, education_text: String) -> Self {
        Self {
            location: reading.location.clone(),
            city: reading.city.clone(),
            efficiency_percent: reading.efficiency_percent,
            daily_energy_kwh: reading.daily_energy_kwh,
            pedestrians_per_day: reading.pedestrians_per_day,
            equivalent: EnergyEquivalent::from_kwh(reading.daily_energy_kwh),
            education_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalents_floor_each_unit() {
        let eq = EnergyEquivalent::from_kwh(0.755);
        assert_eq!(eq.street_lights, 1);
        assert_eq!(eq.tv_hours, 7);
        assert_eq!(eq.phone_charges, 75);
    }

    #[test]
    fn equivalents_are_zero_for_no_energy() {
        assert_eq!(
            EnergyEquivalent::from_kwh(0.0),
            EnergyEquivalent {
                street_lights: 0,
                phone_charges: 0,
                tv_hours: 0
            }
        );
        assert_eq!(EnergyEquivalent::from_kwh(-3.0).phone_charges, 0);
        assert_eq!(EnergyEquivalent::from_kwh(f64::NAN).tv_hours, 0);
    }
}
