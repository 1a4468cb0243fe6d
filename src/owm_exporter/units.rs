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

//! Fixed linear conversions between the units the API returns and the extra
//! units emitted when unit fan-out is enabled.

const ZERO_CELSIUS_KELVIN: f64 = 273.15;
const MPS_TO_MPH: f64 = 2.237;
const METERS_TO_MILES: f64 = 0.00062137;

pub fn celsius_to_kelvin(c: f64) -> f64 {
    c + ZERO_CELSIUS_KELVIN
}

pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - ZERO_CELSIUS_KELVIN
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn mps_to_mph(mps: f64) -> f64 {
    mps * MPS_TO_MPH
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters * METERS_TO_MILES
}

#[cfg(test)]
mod tests {
    use super::{celsius_to_fahrenheit, celsius_to_kelvin, kelvin_to_celsius, meters_to_miles, mps_to_mph};

    const EPSILON: f64 = 1e-9;

    fn assert_close(expected: f64, actual: f64) {
        assert!(
            (expected - actual).abs() < EPSILON,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_kelvin_to_celsius() {
        assert_close(-273.15, kelvin_to_celsius(0.0));
        assert_close(0.0, kelvin_to_celsius(273.15));
        assert_close(100.0, kelvin_to_celsius(373.15));
        assert_close(26.85, kelvin_to_celsius(300.0));
    }

    #[test]
    fn test_kelvin_round_trip() {
        for k in [0.0, 273.15, 373.15] {
            assert_close(k, celsius_to_kelvin(kelvin_to_celsius(k)));
        }
    }

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert_close(32.0, celsius_to_fahrenheit(0.0));
        assert_close(212.0, celsius_to_fahrenheit(100.0));
        assert_close(-40.0, celsius_to_fahrenheit(-40.0));
    }

    #[test]
    fn test_speed_and_distance() {
        assert_close(22.37, mps_to_mph(10.0));
        assert_close(6.2137, meters_to_miles(10000.0));
        assert_close(0.0, meters_to_miles(0.0));
    }
}
