//! Config file to running client.

use std::time::Duration;

use tubesort_client::HttpBackend;
use tubesort_engine::{App, TubesortConfig};
use wiremock::MockServer;

use crate::common::{mount_initial_state, mount_top_moves, one_move};

#[tokio::test]
async fn config_file_points_the_client_at_the_server() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[server]\nbase_url = \"{}\"\nrequest_timeout_seconds = 3\n\n[play]\nstep_delay_ms = 250\n",
            server.uri()
        ),
    )
    .unwrap();

    let config = TubesortConfig::load_from(path).unwrap().unwrap();
    let backend_config = config.backend_config();
    assert_eq!(backend_config.request_timeout, Duration::from_secs(3));
    let settings = config.engine_settings();
    assert_eq!(settings.step_delay, Duration::from_millis(250));
    assert_eq!(settings.tube_capacity, 4);

    let mut app = App::new(HttpBackend::new(&backend_config).unwrap(), settings);
    app.bootstrap().await;
    assert_eq!(app.board().unwrap().tubes().len(), 3);
    assert_eq!(app.moves().len(), 1);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[puzzle]\ntube_capacity = 5\n").unwrap();

    let config = TubesortConfig::load_from(path).unwrap().unwrap();
    let settings = config.engine_settings();
    assert_eq!(settings.tube_capacity, 5);
    assert_eq!(settings.dead_end_delay, Duration::from_millis(500));
    assert!(settings.report_dead_ends);
}
