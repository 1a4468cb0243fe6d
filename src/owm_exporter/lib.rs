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

//! Prometheus metrics exporter for OpenWeatherMap
//!
//! ## Features
//!
//! `owm_exporter` fetches current weather for a list of locations using the [OpenWeatherMap]
//! "group" API and emits it as Prometheus metrics. Responses are cached for a configurable
//! amount of time (ten minutes by default) so that frequent scrapes don't use up the request
//! quota of an API key. Data is only fetched when Prometheus scrapes the exporter. The
//! following metrics are emitted.
//!
//! * `weather_up` - `1` if weather data could be fetched, `0` otherwise.
//! * `weather_cloudiness_percent` - Cloud cover in percent.
//! * `weather_feelslike_celsius` - Temperature taking human perception into account, in celsius.
//! * `weather_humidity_percent` - Humidity in percent.
//! * `weather_pressure_hpa` - Atmospheric pressure in hectopascal.
//! * `weather_sunrise_timestamp` - Sunrise time as a UNIX timestamp.
//! * `weather_sunset_timestamp` - Sunset time as a UNIX timestamp.
//! * `weather_temperature_celsius` - Temperature in celsius.
//! * `weather_temperature_max_celsius` - Maximum temperature in celsius.
//! * `weather_temperature_min_celsius` - Minimum temperature in celsius.
//! * `weather_visibility_meters` - Visibility in meters.
//! * `weather_winddirection_degrees` - Wind direction in degrees.
//! * `weather_windspeed_mps` - Wind speed in meters per second.
//!
//! Every metric except `weather_up` has the labels `location_id`, `location_name`,
//! `location_country`, `latitude`, and `longitude`.
//!
//! When run with `--unit-fan-out`, temperatures are also emitted in fahrenheit and kelvin
//! (e.g. `weather_temperature_fahrenheit`, `weather_temperature_kelvin`), visibility in
//! miles (`weather_visibility_miles`), and wind speed in miles per hour (`weather_windspeed_mph`).
//!
//! [OpenWeatherMap]: https://openweathermap.org/current
//!
//! ## Build
//!
//! `owm_exporter` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Picking locations
//!
//! `owm_exporter` needs an OpenWeatherMap API key and the IDs of the locations to fetch weather
//! for. City IDs can be found by searching for a city on the OpenWeatherMap site: the ID is the
//! number at the end of the city page URL. For example `2643743` is the ID for London and
//! `2988507` is the ID for Paris.
//!
//! ```text
//! ./owm_exporter --api-key YOUR_KEY --location-ids 2643743,2988507
//! ```
//!
//! At startup, `owm_exporter` fetches weather once and exits with an error if no locations were
//! returned, since this usually means the API key or location IDs are wrong.
//!
//! ### Caching
//!
//! Use `--cache-ttl` to control how long a response is reused. It accepts durations such as
//! `30s`, `10m`, or `1h30m`.
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on `localhost:9755` at `/metrics` by default. Use
//! `--listen-address` to change this. Add the host running `owm_exporter` as a target under
//! the Prometheus `scrape_configs` section as described by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     60s
//!   evaluation_interval: 60s
//!
//! scrape_configs:
//! - job_name: owm_exporter
//!   static_configs:
//!   - targets: ['localhost:9755']
//! ```
//!

pub mod cache;
pub mod client;
pub mod duration;
pub mod http;
pub mod metrics;
pub mod units;
