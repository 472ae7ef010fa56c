//! Open-Meteo request parameters and the reshaping of its responses.
//!
//! Upstream responses are column-oriented (`hourly.temperature_2m[i]`); the
//! dashboard wants one object per hour/day with units and derived labels.
//! Everything here works on `serde_json::Value` so missing upstream columns
//! degrade to `null` instead of failing the whole response.

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use super::codes::{comfort, description, icon, uv_risk};

// ---

/// Query parameters shared by every upstream call.
pub type Params = Vec<(&'static str, String)>;

const CURRENT_VARS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "is_day",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "pressure_msl",
    "surface_pressure",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

const FORECAST_HOURLY_VARS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation_probability",
    "precipitation",
    "weather_code",
    "wind_speed_10m",
];

const FORECAST_DAILY_VARS: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "sunrise",
    "sunset",
    "precipitation_sum",
    "precipitation_probability_max",
    "wind_speed_10m_max",
];

const ANALYTICS_HOURLY_VARS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "dewpoint_2m",
    "apparent_temperature",
    "precipitation_probability",
    "precipitation",
    "rain",
    "snowfall",
    "snow_depth",
    "weather_code",
    "pressure_msl",
    "surface_pressure",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "visibility",
    "evapotranspiration",
    "vapour_pressure_deficit",
    "wind_speed_10m",
    "wind_speed_80m",
    "wind_direction_10m",
    "wind_direction_80m",
    "wind_gusts_10m",
    "uv_index",
    "uv_index_clear_sky",
    "sunshine_duration",
    "shortwave_radiation",
    "direct_radiation",
    "diffuse_radiation",
    "direct_normal_irradiance",
    "terrestrial_radiation",
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "soil_temperature_18cm",
    "soil_moisture_0_to_1cm",
    "soil_moisture_1_to_3cm",
    "soil_moisture_3_to_9cm",
    "cape",
    "freezing_level_height",
    "is_day",
];

const ANALYTICS_DAILY_VARS: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "sunrise",
    "sunset",
    "daylight_duration",
    "sunshine_duration",
    "uv_index_max",
    "uv_index_clear_sky_max",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "precipitation_hours",
    "precipitation_probability_max",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
    "shortwave_radiation_sum",
    "et0_fao_evapotranspiration",
];

/// Hours of hourly forecast returned by the forecast endpoint.
const FORECAST_HOURS: usize = 24;

fn base_params(lat: f64, lon: f64) -> Params {
    vec![
        ("latitude", lat.to_string()),
        ("longitude", lon.to_string()),
    ]
}

pub fn current_params(lat: f64, lon: f64) -> Params {
    let mut params = base_params(lat, lon);
    params.push(("current", CURRENT_VARS.join(",")));
    params.push(("timezone", "auto".to_string()));
    params
}

pub fn forecast_params(lat: f64, lon: f64, days: u32) -> Params {
    let mut params = base_params(lat, lon);
    params.push(("hourly", FORECAST_HOURLY_VARS.join(",")));
    params.push(("daily", FORECAST_DAILY_VARS.join(",")));
    params.push(("timezone", "auto".to_string()));
    params.push(("forecast_days", days.to_string()));
    params
}

pub fn analytics_params(lat: f64, lon: f64, days: u32, past_days: u32) -> Params {
    let mut params = base_params(lat, lon);
    params.push(("hourly", ANALYTICS_HOURLY_VARS.join(",")));
    params.push(("daily", ANALYTICS_DAILY_VARS.join(",")));
    params.push(("timezone", "auto".to_string()));
    params.push(("forecast_days", days.to_string()));
    params.push(("past_days", past_days.to_string()));
    params
}

// ---

fn column<'a>(block: &'a Value, name: &str) -> &'a [Value] {
    block
        .get(name)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn cell(block: &Value, name: &str, i: usize) -> Value {
    column(block, name).get(i).cloned().unwrap_or(Value::Null)
}

fn as_code(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

fn code_at(block: &Value, name: &str, i: usize) -> Option<i64> {
    column(block, name).get(i).and_then(as_code)
}

fn number_at(block: &Value, name: &str, i: usize) -> Option<f64> {
    column(block, name).get(i).and_then(Value::as_f64)
}

fn location(data: &Value) -> Value {
    json!({
        "latitude": data["latitude"],
        "longitude": data["longitude"],
        "elevation": data["elevation"],
        "timezone": data["timezone"],
    })
}

/// Dashboard shape for current conditions.
pub fn current_body(data: &Value, cached: bool) -> Value {
    // ---
    let current = &data["current"];
    let code = as_code(&current["weather_code"]);
    let is_day = as_code(&current["is_day"]) == Some(1);

    json!({
        "status": "ok",
        "source": "open-meteo",
        "cached": cached,
        "location": location(data),
        "current": {
            "time": current["time"],
            "temperature": current["temperature_2m"],
            "temperature_unit": "°C",
            "feels_like": current["apparent_temperature"],
            "humidity": current["relative_humidity_2m"],
            "humidity_unit": "%",
            "pressure": current["pressure_msl"],
            "pressure_unit": "hPa",
            "wind_speed": current["wind_speed_10m"],
            "wind_speed_unit": "km/h",
            "wind_direction": current["wind_direction_10m"],
            "wind_gusts": current["wind_gusts_10m"],
            "cloud_cover": current["cloud_cover"],
            "precipitation": current["precipitation"],
            "weather_code": current["weather_code"],
            "weather_description": description(code),
            "weather_icon": icon(code, is_day),
            "is_day": is_day,
        },
    })
}

/// Dashboard shape for the next 24 hours plus the daily forecast.
pub fn forecast_body(data: &Value, cached: bool) -> Value {
    // ---
    let hourly = &data["hourly"];
    let daily = &data["daily"];

    let hours: Vec<Value> = column(hourly, "time")
        .iter()
        .take(FORECAST_HOURS)
        .enumerate()
        .map(|(i, time)| {
            let code = code_at(hourly, "weather_code", i);
            json!({
                "time": time,
                "temperature": cell(hourly, "temperature_2m", i),
                "humidity": cell(hourly, "relative_humidity_2m", i),
                "precipitation_probability": cell(hourly, "precipitation_probability", i),
                "precipitation": cell(hourly, "precipitation", i),
                "weather_code": cell(hourly, "weather_code", i),
                "weather_description": description(code),
                "weather_icon": icon(code, true),
                "wind_speed": cell(hourly, "wind_speed_10m", i),
            })
        })
        .collect();

    let days: Vec<Value> = column(daily, "time")
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let code = code_at(daily, "weather_code", i);
            json!({
                "date": date,
                "temperature_max": cell(daily, "temperature_2m_max", i),
                "temperature_min": cell(daily, "temperature_2m_min", i),
                "sunrise": cell(daily, "sunrise", i),
                "sunset": cell(daily, "sunset", i),
                "precipitation_sum": cell(daily, "precipitation_sum", i),
                "precipitation_probability": cell(daily, "precipitation_probability_max", i),
                "weather_code": cell(daily, "weather_code", i),
                "weather_description": description(code),
                "weather_icon": icon(code, true),
                "wind_speed_max": cell(daily, "wind_speed_10m_max", i),
            })
        })
        .collect();

    json!({
        "status": "ok",
        "source": "open-meteo",
        "cached": cached,
        "location": location(data),
        "hourly": hours,
        "daily": days,
    })
}

fn analytics_hour(h: &Value, i: usize, time: &Value) -> Value {
    // ---
    let code = code_at(h, "weather_code", i);
    let is_day = code_at(h, "is_day", i) == Some(1);
    let uv = number_at(h, "uv_index", i);
    let comfort_index = match (
        number_at(h, "temperature_2m", i),
        number_at(h, "relative_humidity_2m", i),
    ) {
        (Some(temp), Some(humidity)) => json!(comfort(temp, humidity)),
        _ => Value::Null,
    };

    json!({
        "time": time,
        "is_day": is_day,
        "weather": {
            "code": cell(h, "weather_code", i),
            "description": description(code),
            "icon": icon(code, is_day),
        },
        "temperature": {
            "actual": cell(h, "temperature_2m", i),
            "feels_like": cell(h, "apparent_temperature", i),
            "dewpoint": cell(h, "dewpoint_2m", i),
        },
        "humidity": cell(h, "relative_humidity_2m", i),
        "precipitation": {
            "probability": cell(h, "precipitation_probability", i),
            "total": cell(h, "precipitation", i),
            "rain": cell(h, "rain", i),
            "snowfall": cell(h, "snowfall", i),
            "snow_depth": cell(h, "snow_depth", i),
        },
        "pressure": {
            "sea_level": cell(h, "pressure_msl", i),
            "surface": cell(h, "surface_pressure", i),
        },
        "wind": {
            "speed_10m": cell(h, "wind_speed_10m", i),
            "speed_80m": cell(h, "wind_speed_80m", i),
            "direction_10m": cell(h, "wind_direction_10m", i),
            "direction_80m": cell(h, "wind_direction_80m", i),
            "gusts": cell(h, "wind_gusts_10m", i),
        },
        "clouds": {
            "total": cell(h, "cloud_cover", i),
            "low": cell(h, "cloud_cover_low", i),
            "mid": cell(h, "cloud_cover_mid", i),
            "high": cell(h, "cloud_cover_high", i),
        },
        "visibility": cell(h, "visibility", i),
        "uv": {
            "index": cell(h, "uv_index", i),
            "clear_sky": cell(h, "uv_index_clear_sky", i),
            "risk": uv.map(uv_risk),
        },
        "solar": {
            "shortwave": cell(h, "shortwave_radiation", i),
            "direct": cell(h, "direct_radiation", i),
            "diffuse": cell(h, "diffuse_radiation", i),
            "dni": cell(h, "direct_normal_irradiance", i),
            "terrestrial": cell(h, "terrestrial_radiation", i),
            "sunshine_duration": cell(h, "sunshine_duration", i),
        },
        "soil": {
            "temperature_surface": cell(h, "soil_temperature_0cm", i),
            "temperature_6cm": cell(h, "soil_temperature_6cm", i),
            "temperature_18cm": cell(h, "soil_temperature_18cm", i),
            "moisture_0_1cm": cell(h, "soil_moisture_0_to_1cm", i),
            "moisture_1_3cm": cell(h, "soil_moisture_1_to_3cm", i),
            "moisture_3_9cm": cell(h, "soil_moisture_3_to_9cm", i),
        },
        "atmospheric": {
            "evapotranspiration": cell(h, "evapotranspiration", i),
            "vapour_pressure_deficit": cell(h, "vapour_pressure_deficit", i),
            "cape": cell(h, "cape", i),
            "freezing_level": cell(h, "freezing_level_height", i),
        },
        "comfort": comfort_index,
    })
}

fn analytics_day(d: &Value, i: usize, date: &Value) -> Value {
    // ---
    let code = code_at(d, "weather_code", i);

    json!({
        "date": date,
        "weather": {
            "code": cell(d, "weather_code", i),
            "description": description(code),
            "icon": icon(code, true),
        },
        "temperature": {
            "max": cell(d, "temperature_2m_max", i),
            "min": cell(d, "temperature_2m_min", i),
            "feels_like_max": cell(d, "apparent_temperature_max", i),
            "feels_like_min": cell(d, "apparent_temperature_min", i),
        },
        "sun": {
            "sunrise": cell(d, "sunrise", i),
            "sunset": cell(d, "sunset", i),
            "daylight_duration": cell(d, "daylight_duration", i),
            "sunshine_duration": cell(d, "sunshine_duration", i),
        },
        "uv": {
            "max": cell(d, "uv_index_max", i),
            "clear_sky_max": cell(d, "uv_index_clear_sky_max", i),
            "risk": number_at(d, "uv_index_max", i).map(uv_risk),
        },
        "precipitation": {
            "sum": cell(d, "precipitation_sum", i),
            "rain": cell(d, "rain_sum", i),
            "snow": cell(d, "snowfall_sum", i),
            "hours": cell(d, "precipitation_hours", i),
            "probability_max": cell(d, "precipitation_probability_max", i),
        },
        "wind": {
            "speed_max": cell(d, "wind_speed_10m_max", i),
            "gusts_max": cell(d, "wind_gusts_10m_max", i),
            "direction_dominant": cell(d, "wind_direction_10m_dominant", i),
        },
        "solar": {
            "radiation_sum": cell(d, "shortwave_radiation_sum", i),
            "et0_evapotranspiration": cell(d, "et0_fao_evapotranspiration", i),
        },
    })
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn numbers(block: &Value, name: &str, positive_only: bool) -> Vec<f64> {
    column(block, name)
        .iter()
        .filter_map(Value::as_f64)
        .filter(|v| !positive_only || *v > 0.0)
        .collect()
}

/// Index of the first hour at or after `now`, falling back to the first hour.
fn current_hour_index(times: &[Value], now: NaiveDateTime) -> Option<usize> {
    // ---
    if times.is_empty() {
        return None;
    }
    let position = times.iter().position(|t| {
        t.as_str()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok())
            .is_some_and(|t| t >= now)
    });
    Some(position.unwrap_or(0))
}

/// Full analytics shape: per-hour and per-day groups, a summary and units.
///
/// `now` is compared against the upstream local-time stamps to pick the
/// current hour; `past_days` selects which daily entry counts as today.
pub fn analytics_body(
    data: &Value,
    cached: bool,
    past_days: u32,
    now: NaiveDateTime,
    generated_at: &str,
) -> Value {
    // ---
    let h = &data["hourly"];
    let d = &data["daily"];

    let hour_times = column(h, "time");
    let hours: Vec<Value> = hour_times
        .iter()
        .enumerate()
        .map(|(i, time)| analytics_hour(h, i, time))
        .collect();
    let days: Vec<Value> = column(d, "time")
        .iter()
        .enumerate()
        .map(|(i, date)| analytics_day(d, i, date))
        .collect();

    let current = current_hour_index(hour_times, now);
    let current_of = |name: &str| current.map(|i| cell(h, name, i)).unwrap_or(Value::Null);
    let today = days
        .get(past_days as usize)
        .or_else(|| days.first())
        .cloned()
        .unwrap_or(Value::Null);

    let temps = numbers(h, "temperature_2m", false);
    let uv_values = numbers(h, "uv_index", true);
    let wind_speeds = numbers(h, "wind_speed_10m", false);
    let solar_values = numbers(h, "shortwave_radiation", true);
    let uv_max = max(&uv_values).unwrap_or(0.0);

    let summary = json!({
        "temperature": {
            "current": current_of("temperature_2m"),
            "min": min(&temps),
            "max": max(&temps),
            "avg": mean(&temps),
        },
        "uv": {
            "current": current_of("uv_index"),
            "max": uv_max,
            "max_risk": uv_risk(uv_max),
        },
        "wind": {
            "current": current_of("wind_speed_10m"),
            "max": max(&wind_speeds),
            "avg": mean(&wind_speeds),
        },
        "solar": {
            "current": current_of("shortwave_radiation"),
            "max": max(&solar_values).unwrap_or(0.0),
            "total_today": today["solar"]["radiation_sum"].as_f64().unwrap_or(0.0),
        },
        "comfort": current
            .and_then(|i| hours.get(i))
            .map(|hour| hour["comfort"].clone())
            .unwrap_or(Value::Null),
        "today": today,
    });

    json!({
        "status": "ok",
        "source": "open-meteo",
        "cached": cached,
        "generated_at": generated_at,
        "location": location(data),
        "summary": summary,
        "hourly": hours,
        "daily": days,
        "units": {
            "temperature": "°C",
            "humidity": "%",
            "precipitation": "mm",
            "pressure": "hPa",
            "wind_speed": "km/h",
            "visibility": "m",
            "radiation": "W/m²",
            "soil_moisture": "m³/m³",
            "uv_index": "index",
        },
    })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn analytics_fixture() -> Value {
        json!({
            "latitude": 50.0,
            "longitude": 20.0,
            "elevation": 219.0,
            "timezone": "Europe/Warsaw",
            "hourly": {
                "time": ["2025-06-01T10:00", "2025-06-01T11:00", "2025-06-01T12:00"],
                "temperature_2m": [18.0, 21.0, 24.0],
                "relative_humidity_2m": [50.0, 45.0, 40.0],
                "weather_code": [0, 2, 61],
                "is_day": [1, 1, 1],
                "uv_index": [0.0, 4.0, 6.5],
                "wind_speed_10m": [5.0, 10.0, 15.0],
                "shortwave_radiation": [0.0, 300.0, 650.0]
            },
            "daily": {
                "time": ["2025-05-31", "2025-06-01"],
                "weather_code": [3, 61],
                "uv_index_max": [5.0, 6.5],
                "shortwave_radiation_sum": [12.5, 20.25]
            }
        })
    }

    #[test]
    fn current_params_request_expected_fields() {
        // ---
        let params = current_params(50.5, 20.25);
        assert_eq!(params[0], ("latitude", "50.5".to_string()));
        assert_eq!(params[1], ("longitude", "20.25".to_string()));
        assert!(params.iter().any(|(k, v)| *k == "current" && v.contains("weather_code")));
        assert!(params.contains(&("timezone", "auto".to_string())));
    }

    #[test]
    fn analytics_params_include_past_days() {
        // ---
        let params = analytics_params(1.0, 2.0, 3, 4);
        assert!(params.contains(&("forecast_days", "3".to_string())));
        assert!(params.contains(&("past_days", "4".to_string())));
    }

    #[test]
    fn current_body_remaps_fields() {
        // ---
        let data = json!({
            "latitude": 50.0, "longitude": 20.0, "elevation": 219.0, "timezone": "Europe/Warsaw",
            "current": {
                "time": "2025-06-01T12:00",
                "temperature_2m": 22.5,
                "apparent_temperature": 21.0,
                "relative_humidity_2m": 40,
                "pressure_msl": 1015.2,
                "wind_speed_10m": 12.0,
                "weather_code": 0,
                "is_day": 0
            }
        });

        let body = current_body(&data, true);
        assert_eq!(body["cached"], json!(true));
        assert_eq!(body["location"]["timezone"], json!("Europe/Warsaw"));
        assert_eq!(body["current"]["temperature"], json!(22.5));
        assert_eq!(body["current"]["pressure_unit"], json!("hPa"));
        assert_eq!(body["current"]["weather_description"], json!("Clear sky"));
        assert_eq!(body["current"]["weather_icon"], json!("🌙"));
        assert_eq!(body["current"]["is_day"], json!(false));
        assert_eq!(body["current"]["wind_gusts"], Value::Null);
    }

    #[test]
    fn forecast_body_limits_hours() {
        // ---
        let times: Vec<String> = (0..48)
            .map(|h| format!("2025-06-{:02}T{:02}:00", 1 + h / 24, h % 24))
            .collect();
        let data = json!({
            "hourly": { "time": times, "weather_code": vec![3; 48] },
            "daily": { "time": ["2025-06-01", "2025-06-02"], "weather_code": [95, 1] }
        });

        let body = forecast_body(&data, false);
        assert_eq!(body["hourly"].as_array().unwrap().len(), 24);
        assert_eq!(body["hourly"][0]["weather_description"], json!("Overcast"));
        assert_eq!(body["daily"].as_array().unwrap().len(), 2);
        assert_eq!(body["daily"][0]["weather_icon"], json!("⛈️"));
        assert_eq!(body["daily"][1]["temperature_max"], Value::Null);
    }

    #[test]
    fn analytics_summary_uses_current_hour_and_today() {
        // ---
        let body = analytics_body(&analytics_fixture(), false, 1, at(11), "2025-06-01T11:00:00Z");
        let summary = &body["summary"];

        assert_eq!(summary["temperature"]["current"], json!(21.0));
        assert_eq!(summary["temperature"]["min"], json!(18.0));
        assert_eq!(summary["temperature"]["max"], json!(24.0));
        assert_eq!(summary["temperature"]["avg"], json!(21.0));
        assert_eq!(summary["uv"]["max"], json!(6.5));
        assert_eq!(summary["uv"]["max_risk"]["level"], json!("High"));
        assert_eq!(summary["wind"]["avg"], json!(10.0));
        assert_eq!(summary["solar"]["max"], json!(650.0));
        assert_eq!(summary["solar"]["total_today"], json!(20.25));
        assert_eq!(summary["today"]["date"], json!("2025-06-01"));
        assert_eq!(summary["comfort"]["level"], json!("Ideal"));
    }

    #[test]
    fn analytics_hours_are_grouped() {
        // ---
        let body = analytics_body(&analytics_fixture(), true, 1, at(11), "now");
        let hour = &body["hourly"][2];

        assert_eq!(hour["weather"]["description"], json!("Slight rain"));
        assert_eq!(hour["temperature"]["actual"], json!(24.0));
        assert_eq!(hour["uv"]["risk"]["level"], json!("High"));
        assert_eq!(hour["soil"]["moisture_0_1cm"], Value::Null);
        assert_eq!(body["units"]["radiation"], json!("W/m²"));
        assert_eq!(body["daily"][0]["uv"]["risk"]["level"], json!("Moderate"));
    }

    #[test]
    fn current_hour_falls_back_to_first() {
        // ---
        let body = analytics_body(&analytics_fixture(), false, 9, at(23), "now");
        assert_eq!(body["summary"]["temperature"]["current"], json!(18.0));
        assert_eq!(body["summary"]["today"]["date"], json!("2025-05-31"));
    }

    #[test]
    fn empty_upstream_yields_null_summary() {
        // ---
        let body = analytics_body(&json!({}), false, 2, at(0), "now");
        assert_eq!(body["summary"]["temperature"]["min"], Value::Null);
        assert_eq!(body["summary"]["uv"]["max"], json!(0.0));
        assert_eq!(body["summary"]["today"], Value::Null);
        assert!(body["hourly"].as_array().unwrap().is_empty());
    }
}
