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

use crate::cache::WeatherCache;
use crate::metrics::WeatherMetrics;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// State shared by all requests: the cache to fetch weather data from and the
/// metrics to convert it with.
#[derive(Debug)]
pub struct RequestContext {
    cache: WeatherCache,
    metrics: WeatherMetrics,
}

impl RequestContext {
    pub fn new(cache: WeatherCache, metrics: WeatherMetrics) -> Self {
        RequestContext { cache, metrics }
    }
}

/// Router exposing metrics at `/metrics`. Any other path is a 404.
pub fn app(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route("/metrics", get(text_metrics))
        .with_state(context)
        .layer(TraceLayer::new_for_http())
}

async fn text_metrics(State(context): State<Arc<RequestContext>>) -> Response {
    let snapshot = context.cache.get_data().await;
    let observations = context.metrics.collect(&snapshot);

    match context.metrics.encode(&observations) {
        Ok(buf) => {
            tracing::debug!(
                message = "encoded prometheus metrics to text format",
                num_bytes = buf.len(),
            );

            ([(CONTENT_TYPE, TEXT_FORMAT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
