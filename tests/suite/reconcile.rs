//! Photo analysis and color review over HTTP.

use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tubesort_engine::{BoardImage, Color, SlotCoord, Tube, ViewEvent};

use crate::common::{bootstrapped, mount_initial_state, mount_top_moves, one_move, start_tubes};

/// What the analyzer reported for the photo.
fn detected_tubes() -> Value {
    json!([
        {"name": "Tube1", "colors": ["BLUE", "BLUE", null, null]},
        {"name": "Tube2", "colors": ["RED", "RED", null, null]},
        {"name": "Tube3", "colors": [null, null, null, null]}
    ])
}

/// `detected_tubes` after swapping slot 1 of Tube1 and Tube2.
fn corrected_tubes() -> Value {
    json!([
        {"name": "Tube1", "colors": ["BLUE", "RED", null, null]},
        {"name": "Tube2", "colors": ["RED", "BLUE", null, null]},
        {"name": "Tube3", "colors": [null, null, null, null]}
    ])
}

fn photo() -> BoardImage {
    BoardImage {
        bytes: vec![0x89, b'P', b'N', b'G'],
        image_type: "image/png".to_string(),
    }
}

async fn mount_analysis(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/analyze_tubes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "tubes": detected_tubes(),
            "warning": "low contrast"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn corrected_colors_are_committed() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;
    mount_analysis(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/update_tubes"))
        .and(body_json(json!({"tubes": corrected_tubes()})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = bootstrapped(&server).await;
    app.analyze_image(photo()).await.unwrap();
    assert!(app.take_events().contains(&ViewEvent::ReconciliationStarted {
        warning: Some("low contrast".to_string()),
    }));
    // The authoritative board is untouched while reviewing.
    assert_eq!(
        app.authoritative_board().unwrap().color_at(SlotCoord::new(0, 0)),
        Some(Color::Red)
    );

    app.select_slot(SlotCoord::new(0, 1)).unwrap();
    app.select_slot(SlotCoord::new(1, 1)).unwrap();
    app.accept_reconciliation().await.unwrap();

    assert!(app.reconciliation().is_none());
    let board = app.authoritative_board().unwrap();
    assert_eq!(board.color_at(SlotCoord::new(0, 0)), Some(Color::Blue));
    assert_eq!(board.color_at(SlotCoord::new(0, 1)), Some(Color::Red));
    assert_eq!(app.board(), app.authoritative_board());
    assert!(app.take_events().contains(&ViewEvent::ReconciliationAccepted));
}

#[tokio::test]
async fn refused_update_keeps_the_review_open() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;
    mount_analysis(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/update_tubes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "error", "message": "Invalid color counts"})),
        )
        .mount(&server)
        .await;

    let mut app = bootstrapped(&server).await;
    app.analyze_image(photo()).await.unwrap();
    app.accept_reconciliation().await.unwrap();

    assert!(app.reconciliation().is_some());
    assert!(app.take_events().contains(&ViewEvent::AcceptFailed {
        reason: "Invalid color counts".to_string(),
    }));

    // Rejecting puts the original board back on screen.
    app.reject_reconciliation().unwrap();
    let original: Vec<Tube> = serde_json::from_value(start_tubes()).unwrap();
    assert_eq!(app.board().unwrap().tubes(), original.as_slice());
}
