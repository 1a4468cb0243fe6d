// owm_exporter - Prometheus metrics exporter for OpenWeatherMap
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::client::{LocationReading, WeatherSnapshot};
use crate::units;
use prometheus_client::encoding::text;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;

const UP_NAME: &str = "weather_up";
const UP_HELP: &str = "Whether the metrics can be collected";

type FloatGauge = Gauge<f64, AtomicU64>;

/// Labels set on every per-location metric.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LocationLabels {
    pub location_id: String,
    pub location_name: String,
    pub location_country: String,
    pub latitude: String,
    pub longitude: String,
}

impl LocationLabels {
    pub fn from_reading(reading: &LocationReading) -> Self {
        LocationLabels {
            location_id: reading.id.to_string(),
            location_name: reading.name.clone(),
            location_country: reading.sys.country.clone(),
            latitude: format!("{:.6}", reading.coordinates.latitude),
            longitude: format!("{:.6}", reading.coordinates.longitude),
        }
    }
}

/// A single gauge emitted for each location.
#[derive(Clone, Copy)]
pub struct Measurement {
    pub name: &'static str,
    pub help: &'static str,
    value: fn(&LocationReading) -> f64,
}

impl Measurement {
    const fn new(name: &'static str, help: &'static str, value: fn(&LocationReading) -> f64) -> Self {
        Measurement { name, help, value }
    }

    pub fn value(&self, reading: &LocationReading) -> f64 {
        (self.value)(reading)
    }
}

impl fmt::Debug for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Measurement")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish()
    }
}

const BASE_MEASUREMENTS: [Measurement; 12] = [
    Measurement::new("weather_cloudiness_percent", "Cloud cover in percentage", |r| {
        r.clouds.cover
    }),
    Measurement::new(
        "weather_feelslike_celsius",
        "Current temperature taking human perception into account, in celsius",
        |r| r.main.feels_like,
    ),
    Measurement::new("weather_humidity_percent", "Humidity in percent", |r| r.main.humidity),
    Measurement::new("weather_pressure_hpa", "Atmospheric pressure in hectopascal", |r| {
        r.main.pressure
    }),
    Measurement::new("weather_sunrise_timestamp", "Sunrise time as a UNIX timestamp", |r| {
        r.sys.sunrise
    }),
    Measurement::new("weather_sunset_timestamp", "Sunset time as a UNIX timestamp", |r| r.sys.sunset),
    Measurement::new("weather_temperature_celsius", "Current temperature in celsius", |r| {
        r.main.temperature
    }),
    Measurement::new(
        "weather_temperature_max_celsius",
        "Current maximum temperature in celsius",
        |r| r.main.temperature_max,
    ),
    Measurement::new(
        "weather_temperature_min_celsius",
        "Current minimum temperature in celsius",
        |r| r.main.temperature_min,
    ),
    Measurement::new("weather_visibility_meters", "Visibility in meters", |r| r.visibility),
    Measurement::new("weather_winddirection_degrees", "Wind direction in degrees", |r| {
        r.wind.direction
    }),
    Measurement::new("weather_windspeed_mps", "Wind speed in meters per second", |r| r.wind.speed),
];

const FAN_OUT_MEASUREMENTS: [Measurement; 10] = [
    Measurement::new(
        "weather_feelslike_fahrenheit",
        "Current temperature taking human perception into account, in fahrenheit",
        |r| units::celsius_to_fahrenheit(r.main.feels_like),
    ),
    Measurement::new(
        "weather_feelslike_kelvin",
        "Current temperature taking human perception into account, in kelvin",
        |r| units::celsius_to_kelvin(r.main.feels_like),
    ),
    Measurement::new(
        "weather_temperature_fahrenheit",
        "Current temperature in fahrenheit",
        |r| units::celsius_to_fahrenheit(r.main.temperature),
    ),
    Measurement::new("weather_temperature_kelvin", "Current temperature in kelvin", |r| {
        units::celsius_to_kelvin(r.main.temperature)
    }),
    Measurement::new(
        "weather_temperature_max_fahrenheit",
        "Current maximum temperature in fahrenheit",
        |r| units::celsius_to_fahrenheit(r.main.temperature_max),
    ),
    Measurement::new(
        "weather_temperature_max_kelvin",
        "Current maximum temperature in kelvin",
        |r| units::celsius_to_kelvin(r.main.temperature_max),
    ),
    Measurement::new(
        "weather_temperature_min_fahrenheit",
        "Current minimum temperature in fahrenheit",
        |r| units::celsius_to_fahrenheit(r.main.temperature_min),
    ),
    Measurement::new(
        "weather_temperature_min_kelvin",
        "Current minimum temperature in kelvin",
        |r| units::celsius_to_kelvin(r.main.temperature_min),
    ),
    Measurement::new("weather_visibility_miles", "Visibility in miles", |r| {
        units::meters_to_miles(r.visibility)
    }),
    Measurement::new("weather_windspeed_mph", "Wind speed in miles per hour", |r| {
        units::mps_to_mph(r.wind.speed)
    }),
];

/// One value of one metric produced from a snapshot.
///
/// `labels` is `None` only for the `weather_up` gauge.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub name: &'static str,
    pub labels: Option<LocationLabels>,
    pub value: f64,
}

/// Schema of all metrics exported and the logic to derive them from a `WeatherSnapshot`.
///
/// The schema is fixed when created. Each call to `WeatherMetrics::collect()` walks a
/// snapshot and returns values for it without keeping any state between calls.
#[derive(Debug)]
pub struct WeatherMetrics {
    measurements: Vec<Measurement>,
}

impl WeatherMetrics {
    /// Create metrics for the measurements as returned by the API. If `fan_out` is
    /// set, temperatures, visibility, and wind speed are also emitted in other units.
    pub fn new(fan_out: bool) -> Self {
        let mut measurements = BASE_MEASUREMENTS.to_vec();
        if fan_out {
            measurements.extend_from_slice(&FAN_OUT_MEASUREMENTS);
        }

        WeatherMetrics { measurements }
    }

    /// Compute the value of every metric for every location in the snapshot.
    ///
    /// An empty snapshot produces only `weather_up` with a value of `0`. Otherwise,
    /// `weather_up` is `1` and is followed by each measurement for each location, in
    /// the order the locations appear in the snapshot.
    pub fn collect(&self, snapshot: &WeatherSnapshot) -> Vec<Observation> {
        if snapshot.is_empty() {
            return vec![Observation {
                name: UP_NAME,
                labels: None,
                value: 0.0,
            }];
        }

        let mut out = Vec::with_capacity(1 + snapshot.len() * self.measurements.len());
        out.push(Observation {
            name: UP_NAME,
            labels: None,
            value: 1.0,
        });

        for reading in snapshot.locations.iter() {
            let labels = LocationLabels::from_reading(reading);
            for m in self.measurements.iter() {
                out.push(Observation {
                    name: m.name,
                    labels: Some(labels.clone()),
                    value: m.value(reading),
                });
            }
        }

        out
    }

    /// Encode observations in the Prometheus text format.
    ///
    /// A new registry is built for each call so that series for locations no longer
    /// present (or all locations, when the API is down) are not exported.
    pub fn encode(&self, observations: &[Observation]) -> Result<String, fmt::Error> {
        let mut registry = Registry::default();

        let up = FloatGauge::default();
        registry.register(UP_NAME, UP_HELP, up.clone());

        let mut families = HashMap::with_capacity(self.measurements.len());
        for m in self.measurements.iter() {
            let family = Family::<LocationLabels, FloatGauge>::default();
            registry.register(m.name, m.help, family.clone());
            families.insert(m.name, family);
        }

        for obs in observations {
            match (&obs.labels, families.get(obs.name)) {
                (None, _) if obs.name == UP_NAME => {
                    up.set(obs.value);
                }
                (Some(labels), Some(family)) => {
                    family.get_or_create(labels).set(obs.value);
                }
                _ => {
                    tracing::warn!(message = "skipping observation for unknown metric", metric = obs.name);
                }
            }
        }

        let mut buf = String::new();
        text::encode(&mut buf, &registry)?;
        Ok(buf)
    }
}
