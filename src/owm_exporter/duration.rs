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

use std::error;
use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDurationError {
    Invalid(String),
    MissingUnit(String),
    UnknownUnit(String, String),
    Overflow(String),
}

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(s) => write!(f, "invalid duration \"{}\"", s),
            Self::MissingUnit(s) => write!(f, "missing unit in duration \"{}\"", s),
            Self::UnknownUnit(u, s) => write!(f, "unknown unit \"{}\" in duration \"{}\"", u, s),
            Self::Overflow(s) => write!(f, "duration \"{}\" is too large", s),
        }
    }
}

impl error::Error for ParseDurationError {}

/// Parse a duration such as `10m`, `1h30m`, `1.5s`, or `250ms`.
///
/// A duration is a sequence of decimal numbers, each with an optional fraction and a
/// unit suffix. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, and `h`. The
/// string `0` is accepted without a unit. A leading `-` is accepted and the result is
/// clamped to zero since `Duration` can't be negative.
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    let (negative, mut rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    if rest.is_empty() {
        return Err(ParseDurationError::Invalid(s.to_owned()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num, tail) = rest.split_at(num_end);
        if num.is_empty() {
            return Err(ParseDurationError::Invalid(s.to_owned()));
        }

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        rest = tail;

        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(ParseDurationError::MissingUnit(s.to_owned())),
            _ => return Err(ParseDurationError::UnknownUnit(unit.to_owned(), s.to_owned())),
        };

        let nanos = component_nanos(num, scale).ok_or_else(|| ParseDurationError::Invalid(s.to_owned()))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| ParseDurationError::Overflow(s.to_owned()))?;
    }

    if negative {
        return Ok(Duration::ZERO);
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| ParseDurationError::Overflow(s.to_owned()))?;
    // Always less than one billion so the cast can't truncate
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Nanoseconds for a single `<number><unit>` component, `None` if `num` isn't a
/// valid decimal number or the value doesn't fit.
fn component_nanos(num: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = num.split_once('.').unwrap_or((num, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let mut nanos = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().ok()?.checked_mul(scale)?
    };

    let mut place = scale;
    for c in frac.chars() {
        let digit = c.to_digit(10)? as u128;
        place /= 10;
        nanos = nanos.checked_add(digit.checked_mul(place)?)?;
    }

    Some(nanos)
}
