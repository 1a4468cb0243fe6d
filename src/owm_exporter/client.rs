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

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

/// Error fetching or decoding a response from the OpenWeatherMap API.
#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    Unexpected(StatusCode, Url, String),
    Decode(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::Unexpected(status, url, body) => {
                write!(f, "unexpected status {} for {} - response body: {}", status, url, body)
            }
            Self::Decode(e) => write!(f, "parsing JSON response failed: {}", e),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

/// Error constructing a client from user supplied settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    MissingLocationIds,
    InvalidBaseUrl(Url),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "an API key is required"),
            Self::MissingLocationIds => write!(f, "at least one location ID is required"),
            Self::InvalidBaseUrl(u) => write!(f, "invalid base URL {}", u),
        }
    }
}

impl error::Error for ConfigError {}

/// Client for the OpenWeatherMap "group" endpoint which returns current weather for
/// several locations in a single request.
pub struct WeatherClient {
    client: Client,
    group_url: Url,
    api_key: String,
    location_ids: String,
}

impl fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherClient")
            .field("group_url", &self.group_url)
            .field("location_ids", &self.location_ids)
            .finish_non_exhaustive()
    }
}

impl WeatherClient {
    const USER_AGENT: &'static str = "owm_exporter Prometheus Exporter";
    const JSON_RESPONSE: &'static str = "application/json";
    const UNITS: &'static str = "metric";

    /// Create a new client for a comma separated list of location IDs.
    ///
    /// The API key and list of location IDs must not be empty and the base URL must be
    /// a URL that paths can be appended to (e.g. `https://api.openweathermap.org/`).
    pub fn new<K, L>(client: Client, base_url: Url, api_key: K, location_ids: L) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        L: Into<String>,
    {
        let api_key = api_key.into();
        let location_ids = location_ids.into();

        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if location_ids.split(',').all(|id| id.trim().is_empty()) {
            return Err(ConfigError::MissingLocationIds);
        }

        let mut group_url = base_url.clone();
        group_url
            .path_segments_mut()
            .map(|mut p| {
                p.clear().push("data").push("2.5").push("group");
            })
            .map_err(|_| ConfigError::InvalidBaseUrl(base_url))?;

        Ok(WeatherClient {
            client,
            group_url,
            api_key,
            location_ids,
        })
    }

    /// Location IDs requested by this client, as provided.
    pub fn location_ids(&self) -> &str {
        &self.location_ids
    }

    /// Fetch current weather for every configured location.
    ///
    /// Any transport failure, non-200 response, or body that can't be decoded is
    /// returned as an error. The API key is never included in errors or logs.
    pub async fn group(&self) -> Result<WeatherSnapshot, ClientError> {
        tracing::debug!(
            message = "making group weather request",
            url = %self.group_url,
            location_ids = %self.location_ids,
        );

        let res = self
            .client
            .get(self.group_url.clone())
            .query(&[
                ("units", Self::UNITS),
                ("id", self.location_ids.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(|e| ClientError::Internal(e.without_url()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ClientError::Internal(e.without_url()))?;

        if status != StatusCode::OK {
            return Err(ClientError::Unexpected(status, self.group_url.clone(), body));
        }

        serde_json::from_str::<WeatherSnapshot>(&body).map_err(ClientError::Decode)
    }
}

/// Current weather for all requested locations, in the order the API returned them.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct WeatherSnapshot {
    #[serde(rename = "list", default)]
    pub locations: Vec<LocationReading>,
}

impl WeatherSnapshot {
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Measurements for a single location. Units are those of `units=metric`: temperatures
/// in celsius, distances in meters, speeds in meters per second.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct LocationReading {
    pub id: i64,
    pub name: String,
    pub visibility: f64,
    pub clouds: Clouds,
    #[serde(rename = "coord")]
    pub coordinates: Coordinates,
    pub main: Main,
    pub sys: Sys,
    pub wind: Wind,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Clouds {
    #[serde(rename = "all")]
    pub cover: f64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Main {
    #[serde(rename = "temp")]
    pub temperature: f64,
    #[serde(rename = "temp_min")]
    pub temperature_min: f64,
    #[serde(rename = "temp_max")]
    pub temperature_max: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Sys {
    pub country: String,
    pub sunrise: f64,
    pub sunset: f64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Wind {
    #[serde(rename = "deg")]
    pub direction: f64,
    pub speed: f64,
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, WeatherClient, WeatherSnapshot};
    use reqwest::{Client, Url};

    const GROUP_RESPONSE: &str = r#"{
      "cnt": 1,
      "list": [{
        "coord": {"lon": -0.1257, "lat": 51.5085},
        "sys": {"country": "GB", "timezone": 0, "sunrise": 1697610367, "sunset": 1697647892},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {"temp": 12.5, "feels_like": 11.8, "temp_min": 10.9, "temp_max": 13.7, "pressure": 1012, "humidity": 81},
        "visibility": 10000,
        "wind": {"speed": 4.12, "deg": 230},
        "clouds": {"all": 75},
        "dt": 1697630000,
        "id": 2643743,
        "name": "London"
      }]
    }"#;

    fn base_url() -> Url {
        Url::parse("https://api.openweathermap.org/").unwrap()
    }

    #[test]
    fn test_decode_group_response() {
        let snapshot: WeatherSnapshot = serde_json::from_str(GROUP_RESPONSE).unwrap();
        assert_eq!(1, snapshot.len());

        let london = &snapshot.locations[0];
        assert_eq!(2643743, london.id);
        assert_eq!("London", london.name);
        assert_eq!("GB", london.sys.country);
        assert_eq!(51.5085, london.coordinates.latitude);
        assert_eq!(-0.1257, london.coordinates.longitude);
        assert_eq!(75.0, london.clouds.cover);
        assert_eq!(12.5, london.main.temperature);
        assert_eq!(11.8, london.main.feels_like);
        assert_eq!(10.9, london.main.temperature_min);
        assert_eq!(13.7, london.main.temperature_max);
        assert_eq!(1012.0, london.main.pressure);
        assert_eq!(81.0, london.main.humidity);
        assert_eq!(10000.0, london.visibility);
        assert_eq!(4.12, london.wind.speed);
        assert_eq!(230.0, london.wind.direction);
        assert_eq!(1697610367.0, london.sys.sunrise);
        assert_eq!(1697647892.0, london.sys.sunset);
    }

    #[test]
    fn test_decode_missing_fields_are_zero() {
        let snapshot: WeatherSnapshot = serde_json::from_str(r#"{"list": [{"id": 5, "name": "Nowhere"}]}"#).unwrap();
        let reading = &snapshot.locations[0];

        assert_eq!(5, reading.id);
        assert_eq!("", reading.sys.country);
        assert_eq!(0.0, reading.visibility);
        assert_eq!(0.0, reading.main.temperature);
    }

    #[test]
    fn test_decode_empty_list() {
        let snapshot: WeatherSnapshot = serde_json::from_str(r#"{"cnt": 0, "list": []}"#).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(serde_json::from_str::<WeatherSnapshot>("<html>bad gateway</html>").is_err());
        assert!(serde_json::from_str::<WeatherSnapshot>(r#"{"list": "nope"}"#).is_err());
    }

    #[test]
    fn test_new_requires_api_key() {
        let res = WeatherClient::new(Client::new(), base_url(), " ", "2643743");
        assert_eq!(ConfigError::MissingApiKey, res.unwrap_err());
    }

    #[test]
    fn test_new_requires_location_ids() {
        let res = WeatherClient::new(Client::new(), base_url(), "abc123", "");
        assert_eq!(ConfigError::MissingLocationIds, res.unwrap_err());

        let res = WeatherClient::new(Client::new(), base_url(), "abc123", " , ");
        assert_eq!(ConfigError::MissingLocationIds, res.unwrap_err());
    }

    #[test]
    fn test_new_rejects_unusable_base_url() {
        let url = Url::parse("mailto:weather@example.com").unwrap();
        let res = WeatherClient::new(Client::new(), url.clone(), "abc123", "2643743");
        assert_eq!(ConfigError::InvalidBaseUrl(url), res.unwrap_err());
    }

    #[test]
    fn test_group_url() {
        let url = Url::parse("http://localhost:8080/some/prefix").unwrap();
        let client = WeatherClient::new(Client::new(), url, "abc123", "2643743,2988507").unwrap();

        assert_eq!("http://localhost:8080/data/2.5/group", client.group_url.as_str());
        assert_eq!("2643743,2988507", client.location_ids());
    }
}
