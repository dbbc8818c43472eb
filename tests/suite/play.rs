//! Manual play against the HTTP backend.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tubesort_engine::{Color, Move, SlotCoord, ViewEvent};

use crate::common::{
    bootstrapped, moved_tubes, mount_initial_state, mount_top_moves, one_move, start_tubes,
};

#[tokio::test]
async fn bootstrap_loads_board_and_moves() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;

    let mut app = crate::common::app_for(&server);
    app.bootstrap().await;

    let board = app.board().unwrap();
    assert_eq!(board.color_at(SlotCoord::new(0, 1)), Some(Color::Blue));
    assert_eq!(app.moves()[0].movement, Move::new("Tube1", "Tube3"));
    let events = app.take_events();
    assert!(events.contains(&ViewEvent::BoardChanged));
    assert!(events.contains(&ViewEvent::MovesUpdated { count: 1 }));
}

#[tokio::test]
async fn dead_end_is_reported_then_undone() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), Some(1)).await;
    mount_top_moves(&server, json!({"top_moves": []}), Some(1)).await;
    mount_top_moves(&server, one_move(), None).await;

    Mock::given(method("POST"))
        .and(path("/api/apply_move"))
        .and(body_json(json!({"from_tube": "Tube1", "to_tube": "Tube3"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "tubes": moved_tubes()})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/add_dead_end"))
        .and(body_json(json!({"state": moved_tubes()})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/undo_move"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tubes": start_tubes()})))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = bootstrapped(&server).await;
    app.apply_ranked(0).await.unwrap();
    assert!(app.is_dead_end());
    assert!(app.has_pending());
    assert!(
        app.take_events()
            .contains(&ViewEvent::DeadEnd { recovering: true })
    );

    app.run_pending().await;

    assert!(!app.is_dead_end());
    assert_eq!(
        app.board().unwrap().color_at(SlotCoord::new(2, 0)),
        Some(Color::Empty)
    );
    assert_eq!(app.moves().len(), 1);
}

#[tokio::test]
async fn rejected_move_leaves_board_alone() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;
    Mock::given(method("POST"))
        .and(path("/api/apply_move"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"status": "error", "message": "Invalid move"})),
        )
        .mount(&server)
        .await;

    let mut app = bootstrapped(&server).await;
    let before = app.board().cloned();
    app.apply_manual(Move::new("Tube3", "Tube1")).await.unwrap();

    assert_eq!(app.board().cloned(), before);
    assert!(app.take_events().contains(&ViewEvent::MoveRejected {
        movement: Move::new("Tube3", "Tube1"),
        reason: "Invalid move".to_string(),
    }));
}

#[tokio::test]
async fn server_error_on_load_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/initial_state"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut app = crate::common::app_for(&server);
    app.bootstrap().await;

    assert!(app.board().is_none());
    assert!(app.take_events().iter().any(|event| matches!(
        event,
        ViewEvent::TransportFailure {
            context: "load the puzzle",
            ..
        }
    )));
}
