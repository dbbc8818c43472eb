//! Shared test utilities and fixtures
//!
//! A wiremock puzzle server plus helpers to mount its endpoints.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tubesort_client::{HttpBackend, HttpBackendConfig};
use tubesort_engine::{App, EngineSettings};

/// The puzzle every test starts from.
pub fn start_tubes() -> Value {
    json!([
        {"name": "Tube1", "colors": ["RED", "BLUE", null, null]},
        {"name": "Tube2", "colors": ["BLUE", "RED", null, null]},
        {"name": "Tube3", "colors": [null, null, null, null]}
    ])
}

/// `start_tubes` after `Tube1 -> Tube3`.
pub fn moved_tubes() -> Value {
    json!([
        {"name": "Tube1", "colors": ["RED", null, null, null]},
        {"name": "Tube2", "colors": ["BLUE", "RED", null, null]},
        {"name": "Tube3", "colors": ["BLUE", null, null, null]}
    ])
}

pub fn one_move() -> Value {
    json!({"top_moves": [{"movement": ["Tube1", "Tube3"], "score": 5}]})
}

pub fn app_for(server: &MockServer) -> App<HttpBackend> {
    let backend = HttpBackend::new(&HttpBackendConfig {
        base_url: server.uri(),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
    })
    .expect("client builds");
    let settings = EngineSettings {
        step_delay: Duration::from_millis(10),
        dead_end_delay: Duration::from_millis(10),
        ..EngineSettings::default()
    };
    App::new(backend, settings)
}

pub async fn mount_initial_state(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/initial_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tubes": start_tubes()})))
        .mount(server)
        .await;
}

/// Mount a `top_moves` reply. With `times`, the mock retires after that many
/// calls and the next mounted one answers.
pub async fn mount_top_moves(server: &MockServer, body: Value, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/api/top_moves"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body));
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(server).await;
}

/// An app that has loaded `start_tubes` and one ranked move, events drained.
pub async fn bootstrapped(server: &MockServer) -> App<HttpBackend> {
    let mut app = app_for(server);
    app.bootstrap().await;
    app.take_events();
    app
}
