use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::dto::Resource;
use crate::error::{AppError, AppResult};
use crate::services::weather::{Advice, WeatherReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
}

impl WeatherQuery {
    fn validate_coordinates(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err("latitude must be between -90 and 90".into());
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err("longitude must be between -180 and 180".into());
        }
        Ok(())
    }
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<Resource<WeatherReport>>> {
    query.validate_coordinates().map_err(AppError::Validation)?;

    let result = state.weather.forecast(query.latitude, query.longitude).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Weather lookup failed");
    }

    Ok(Json(result.into()))
}

pub async fn get_advice(State(state): State<AppState>) -> Json<Resource<Advice>> {
    let result = state.weather.advice().await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Advice lookup failed");
    }

    Json(result.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range() {
        let ok = WeatherQuery { latitude: 52.5, longitude: 13.4 };
        assert!(ok.validate_coordinates().is_ok());

        let bad_lat = WeatherQuery { latitude: 91.0, longitude: 0.0 };
        assert!(bad_lat.validate_coordinates().is_err());

        let bad_lon = WeatherQuery { latitude: 0.0, longitude: -180.5 };
        assert!(bad_lon.validate_coordinates().is_err());
    }
}
