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

use crate::client::{WeatherClient, WeatherSnapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Arc<WeatherSnapshot>,
    fetched: Option<Instant>,
}

impl CacheState {
    fn fresh(&self, now: Instant, ttl: Duration) -> Option<Arc<WeatherSnapshot>> {
        match self.fetched {
            Some(fetched) if now.saturating_duration_since(fetched) < ttl => Some(Arc::clone(&self.snapshot)),
            _ => None,
        }
    }
}

/// Most recent successful response from the API, reused until it is older than the TTL.
///
/// Data is only fetched when requested, there is no background refresh. Failed fetches
/// don't modify the cache: the previous snapshot and the time it was fetched are kept
/// as-is, so the next call after a failure tries the API again.
#[derive(Debug)]
pub struct WeatherCache {
    client: WeatherClient,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl WeatherCache {
    pub fn new(client: WeatherClient, ttl: Duration) -> Self {
        WeatherCache {
            client,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get current weather for all locations, from the cache if still fresh or the API
    /// otherwise. An empty snapshot is returned if the API request fails for any reason.
    pub async fn get_data(&self) -> Arc<WeatherSnapshot> {
        let cached = self.lock().fresh(Instant::now(), self.ttl);
        if let Some(snapshot) = cached {
            tracing::debug!(message = "using cached weather data", locations = snapshot.len());
            return snapshot;
        }

        // The lock is released while the request is in flight. Concurrent callers that
        // find the cache stale will each make a request and the last to finish wins.
        match self.client.group().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                {
                    let mut state = self.lock();
                    state.snapshot = Arc::clone(&snapshot);
                    state.fetched = Some(Instant::now());
                }

                tracing::info!(
                    message = "fetched new weather data",
                    location_ids = %self.client.location_ids(),
                    locations = snapshot.len(),
                );
                snapshot
            }
            Err(e) => {
                tracing::error!(message = "failed to fetch weather data", error = %e);
                Arc::new(WeatherSnapshot::default())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
