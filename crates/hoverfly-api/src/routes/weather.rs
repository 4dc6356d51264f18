//! Current-conditions lookup with flight-suitability scoring.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;

use hoverfly_domain::FieldError;

use crate::auth::Principal;
use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};

const UNITS: [&str; 3] = ["metric", "imperial", "kelvin"];

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub units: Option<String>,
}

impl WeatherQuery {
    fn validate(&self) -> Result<&str, ApiError> {
        let mut errors = Vec::new();
        if !(-90.0..=90.0).contains(&self.lat) {
            errors.push(FieldError::invalid("lat", "must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            errors.push(FieldError::invalid("lon", "must be between -180 and 180"));
        }
        let units = self.units.as_deref().unwrap_or("metric");
        if !UNITS.contains(&units) {
            errors.push(FieldError::invalid(
                "units",
                "must be one of metric, imperial, kelvin",
            ));
        }
        if errors.is_empty() {
            Ok(units)
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

pub async fn current_weather(
    State(ctx): State<ApiContext>,
    _principal: Principal,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(query) = query.map_err(|e| {
        ApiError::Validation(vec![FieldError::invalid("query", &e.body_text())])
    })?;
    let units = query.validate()?;

    let report = ctx.weather.current(query.lat, query.lon, units).await?;
    Ok(Json(json!({ "weather": report })))
}
