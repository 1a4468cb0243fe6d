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

use clap::Parser;
use owm_exporter::cache::WeatherCache;
use owm_exporter::client::WeatherClient;
use owm_exporter::duration::parse_duration;
use owm_exporter::http::RequestContext;
use owm_exporter::metrics::WeatherMetrics;
use reqwest::{Client, Url};
use std::error::Error;
use std::io;
use std::net::TcpListener;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_LISTEN_ADDR: &str = "localhost:9755";
const DEFAULT_CACHE_TTL: &str = "10m";
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_API_URL: &str = "https://api.openweathermap.org/";

#[derive(Debug, Parser)]
#[clap(name = "owm_exporter", version = clap::crate_version!())]
struct OwmExporterApplication {
    /// API key for OpenWeatherMap
    #[clap(long)]
    api_key: String,

    /// Comma separated list of location IDs to fetch weather for
    #[clap(long)]
    location_ids: String,

    /// Base URL for the OpenWeatherMap API
    #[clap(long, default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// How long to reuse a response from the OpenWeatherMap API before fetching new
    /// data, e.g. '90s', '10m', or '1h30m'
    #[clap(long, default_value = DEFAULT_CACHE_TTL, value_parser = parse_duration)]
    cache_ttl: Duration,

    /// Timeout for fetching weather from the OpenWeatherMap API, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Also emit temperatures in fahrenheit and kelvin, visibility in miles, and wind
    /// speed in miles per hour
    #[clap(long)]
    unit_fan_out: bool,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Hostname and port to listen on
    #[clap(long, default_value_t = DEFAULT_LISTEN_ADDR.into())]
    listen_address: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = OwmExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = WeatherClient::new(http_client, opts.api_url.clone(), opts.api_key, opts.location_ids)
        .unwrap_or_else(|e| {
            tracing::error!(message = "invalid configuration", error = %e);
            process::exit(1)
        });

    // Make an initial request for weather data. This allows us to verify that the API
    // key and locations the user provided are valid and the API is available before
    // starting the HTTP server and running indefinitely.
    let cache = WeatherCache::new(client, opts.cache_ttl);
    let initial = cache.get_data().await;
    if initial.is_empty() {
        tracing::error!(message = "no locations returned by initial weather request");
        process::exit(1)
    }

    tracing::info!(
        message = "verified weather data",
        api_url = %opts.api_url,
        locations = initial.len(),
        cache_ttl = ?cache.ttl(),
    );

    let metrics = WeatherMetrics::new(opts.unit_fan_out);
    let context = Arc::new(RequestContext::new(cache, metrics));
    let app = owm_exporter::http::app(context);

    let listener = TcpListener::bind(&opts.listen_address).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.listen_address, error = %e);
        process::exit(1)
    });
    let sock = listener.local_addr()?;
    let server = axum::Server::from_tcp(listener)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error creating server", address = %sock, error = %e);
            process::exit(1)
        })
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        });

    tracing::info!(message = "server started", address = %sock);
    server.await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
