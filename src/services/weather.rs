//! Reqwest-backed client for the weather and advice widgets.
//!
//! Transport only: build the request, check the status, decode the JSON into
//! transport DTOs, then map to the widget types in one pass. No retries and no
//! caching; callers fold failures into an error envelope.

use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode";

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    weather_url: String,
    advice_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
    pub description: &'static str,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub max_c: f64,
    pub min_c: f64,
    pub weather_code: i32,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Advice {
    pub id: i64,
    pub advice: String,
}

// ── Transport DTOs ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ForecastDto {
    current_weather: CurrentWeatherDto,
    #[serde(default)]
    daily: Option<DailyDto>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherDto {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct DailyDto {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weathercode: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct AdviceDto {
    slip: SlipDto,
}

#[derive(Debug, Deserialize)]
struct SlipDto {
    id: i64,
    advice: String,
}

impl DailyDto {
    fn into_days(self) -> anyhow::Result<Vec<DailyForecast>> {
        let days = self.time.len();
        if self.temperature_2m_max.len() != days
            || self.temperature_2m_min.len() != days
            || self.weathercode.len() != days
        {
            anyhow::bail!(
                "Malformed weather response: daily arrays differ in length ({} dates, {} max, {} min, {} codes)",
                days,
                self.temperature_2m_max.len(),
                self.temperature_2m_min.len(),
                self.weathercode.len()
            );
        }

        Ok(self
            .time
            .into_iter()
            .zip(self.temperature_2m_max)
            .zip(self.temperature_2m_min)
            .zip(self.weathercode)
            .map(|(((date, max_c), min_c), code)| DailyForecast {
                date,
                max_c,
                min_c,
                weather_code: code,
                description: describe_weather_code(code),
            })
            .collect())
    }
}

impl ForecastDto {
    fn into_report(self) -> anyhow::Result<WeatherReport> {
        let daily = match self.daily {
            Some(d) => d.into_days()?,
            None => Vec::new(),
        };

        Ok(WeatherReport {
            temperature_c: self.current_weather.temperature,
            wind_speed_kmh: self.current_weather.windspeed,
            weather_code: self.current_weather.weathercode,
            description: describe_weather_code(self.current_weather.weathercode),
            daily,
        })
    }
}

impl WeatherClient {
    pub fn new(weather_url: String, advice_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("halocare-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            weather_url,
            advice_url,
        })
    }

    pub async fn forecast(&self, latitude: f64, longitude: f64) -> anyhow::Result<WeatherReport> {
        let response = self
            .client
            .get(&self.weather_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Weather API error {}: {}", status, body);
        }

        let dto: ForecastDto = response.json().await.context("Malformed weather response")?;
        dto.into_report()
    }

    pub async fn advice(&self) -> anyhow::Result<Advice> {
        let response = self.client.get(&self.advice_url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Advice API error {}", status);
        }

        // The advice endpoint does not always send a JSON content type.
        let body = response.text().await?;
        let dto: AdviceDto = serde_json::from_str(&body).context("Malformed advice response")?;
        Ok(Advice {
            id: dto.slip.id,
            advice: dto.slip.advice,
        })
    }
}

/// WMO weather interpretation codes.
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}
