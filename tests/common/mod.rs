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

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use owm_exporter::client::WeatherClient;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "abc123";
pub const LOCATION_IDS: &str = "2643743,2988507";

pub const TWO_LOCATIONS: &str = r#"{
  "cnt": 2,
  "list": [
    {
      "coord": {"lon": -0.1257, "lat": 51.5085},
      "sys": {"country": "GB", "sunrise": 1697610367, "sunset": 1697647892},
      "main": {"temp": 12.5, "feels_like": 11.8, "temp_min": 10.9, "temp_max": 13.7, "pressure": 1012, "humidity": 81},
      "visibility": 10000,
      "wind": {"speed": 4.12, "deg": 230},
      "clouds": {"all": 75},
      "id": 2643743,
      "name": "London"
    },
    {
      "coord": {"lon": 2.3488, "lat": 48.8534},
      "sys": {"country": "FR", "sunrise": 1697609790, "sunset": 1697647574},
      "main": {"temp": 15.2, "feels_like": 14.9, "temp_min": 14.0, "temp_max": 16.1, "pressure": 1009, "humidity": 72},
      "visibility": 9000,
      "wind": {"speed": 3.6, "deg": 200},
      "clouds": {"all": 40},
      "id": 2988507,
      "name": "Paris"
    }
  ]
}"#;

pub const NO_LOCATIONS: &str = r#"{"cnt": 0, "list": []}"#;

#[derive(Debug)]
struct Reply {
    status: StatusCode,
    body: String,
}

/// Fake OpenWeatherMap API that counts requests to the group endpoint and returns
/// whatever status and body it was last told to.
#[derive(Debug)]
pub struct Upstream {
    hits: AtomicUsize,
    reply: Mutex<Reply>,
    last_query: Mutex<HashMap<String, String>>,
}

impl Upstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn reply(&self, status: StatusCode, body: &str) {
        let mut reply = self.reply.lock().unwrap();
        reply.status = status;
        reply.body = body.to_owned();
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.last_query.lock().unwrap().clone()
    }
}

async fn group(
    State(upstream): State<Arc<Upstream>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    *upstream.last_query.lock().unwrap() = params;

    let reply = upstream.reply.lock().unwrap();
    (reply.status, reply.body.clone())
}

/// Serve `router` on an ephemeral local port, returning the address it's bound to.
pub fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener).unwrap().serve(router.into_make_service());
    tokio::spawn(server);
    addr
}

/// Start a fake API that initially responds with `body` and a 200 status.
pub fn start_upstream(body: &str) -> (Arc<Upstream>, Url) {
    let upstream = Arc::new(Upstream {
        hits: AtomicUsize::new(0),
        reply: Mutex::new(Reply {
            status: StatusCode::OK,
            body: body.to_owned(),
        }),
        last_query: Mutex::new(HashMap::new()),
    });

    let router = Router::new()
        .route("/data/2.5/group", get(group))
        .with_state(Arc::clone(&upstream));
    let addr = serve(router);

    (upstream, Url::parse(&format!("http://{}/", addr)).unwrap())
}

pub fn weather_client(base_url: Url) -> WeatherClient {
    WeatherClient::new(Client::new(), base_url, API_KEY, LOCATION_IDS).unwrap()
}
