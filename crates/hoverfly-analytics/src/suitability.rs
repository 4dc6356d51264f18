//! Flight-suitability scoring from weather observations.
//!
//! Threshold arithmetic over wind, visibility, conditions, cloud cover
//! and precipitation, producing a 0-100 score and a go/no-go flag.

use serde::{Deserialize, Serialize};

/// The weather inputs the score depends on, independent of any provider
/// wire format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherObservation {
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Visibility in meters.
    pub visibility: f64,
    /// Cloud cover percentage.
    pub cloud_cover: f64,
    /// Condition group name (`Rain`, `Clear`, `Fog`, ...).
    pub condition: String,
    /// Accumulated precipitation in mm.
    pub precipitation: f64,
}

/// Flight suitability verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightConditions {
    pub suitable: bool,
    pub score: u32,
    pub factors: Vec<String>,
    pub recommendation: String,
}

/// Score an observation for drone flight.
#[must_use]
pub fn flight_suitability(weather: &WeatherObservation) -> FlightConditions {
    let mut score: i32 = 100;
    let mut factors = Vec::new();
    let mut suitable = true;

    if weather.wind_speed > 15.0 {
        score -= 50;
        suitable = false;
        factors.push("High wind speed".to_string());
    } else if weather.wind_speed > 10.0 {
        score -= 25;
        factors.push("Moderate wind speed".to_string());
    } else if weather.wind_speed > 7.0 {
        score -= 10;
        factors.push("Light wind".to_string());
    }

    if weather.visibility < 1000.0 {
        score -= 40;
        suitable = false;
        factors.push("Poor visibility".to_string());
    } else if weather.visibility < 5000.0 {
        score -= 20;
        factors.push("Reduced visibility".to_string());
    }

    const BAD_CONDITIONS: [&str; 4] = ["Rain", "Snow", "Thunderstorm", "Drizzle"];
    if BAD_CONDITIONS.contains(&weather.condition.as_str()) {
        score -= 60;
        suitable = false;
        factors.push(format!("{} conditions", weather.condition));
    } else if weather.condition == "Mist" || weather.condition == "Fog" {
        score -= 30;
        factors.push("Reduced visibility conditions".to_string());
    }

    if weather.cloud_cover > 80.0 {
        score -= 15;
        factors.push("Heavy cloud cover".to_string());
    } else if weather.cloud_cover > 60.0 {
        score -= 10;
        factors.push("Moderate cloud cover".to_string());
    }

    if weather.precipitation > 0.0 {
        score -= 30;
        suitable = false;
        factors.push("Active precipitation".to_string());
    }

    FlightConditions {
        suitable,
        score: score.max(0) as u32,
        factors,
        recommendation: if suitable {
            "Conditions are suitable for flight".to_string()
        } else {
            "Flight not recommended".to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_day() -> WeatherObservation {
        WeatherObservation {
            wind_speed: 3.0,
            visibility: 10_000.0,
            cloud_cover: 10.0,
            condition: "Clear".to_string(),
            precipitation: 0.0,
        }
    }

    #[test]
    fn clear_day_scores_perfect() {
        let conditions = flight_suitability(&clear_day());
        assert!(conditions.suitable);
        assert_eq!(conditions.score, 100);
        assert!(conditions.factors.is_empty());
    }

    #[test]
    fn high_wind_grounds_the_drone() {
        let mut weather = clear_day();
        weather.wind_speed = 16.0;
        let conditions = flight_suitability(&weather);
        assert!(!conditions.suitable);
        assert_eq!(conditions.score, 50);
        assert_eq!(conditions.factors, ["High wind speed"]);
    }

    #[test]
    fn moderate_wind_only_dents_the_score() {
        let mut weather = clear_day();
        weather.wind_speed = 12.0;
        let conditions = flight_suitability(&weather);
        assert!(conditions.suitable);
        assert_eq!(conditions.score, 75);
    }

    #[test]
    fn rain_is_unsuitable() {
        let mut weather = clear_day();
        weather.condition = "Rain".to_string();
        weather.precipitation = 1.2;
        let conditions = flight_suitability(&weather);
        assert!(!conditions.suitable);
        // -60 for rain, -30 for active precipitation.
        assert_eq!(conditions.score, 10);
    }

    #[test]
    fn score_floors_at_zero() {
        let weather = WeatherObservation {
            wind_speed: 20.0,
            visibility: 200.0,
            cloud_cover: 95.0,
            condition: "Thunderstorm".to_string(),
            precipitation: 5.0,
        };
        let conditions = flight_suitability(&weather);
        assert!(!conditions.suitable);
        assert_eq!(conditions.score, 0);
        assert_eq!(
            conditions.recommendation,
            "Flight not recommended"
        );
    }
}
