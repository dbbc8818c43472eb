//! Solving and paced execution over HTTP.

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tubesort_engine::{Color, Move, SlotCoord, SolvePhase, ViewEvent};

use crate::common::{
    bootstrapped, moved_tubes, mount_initial_state, mount_top_moves, one_move,
};

fn two_step_solution() -> Value {
    json!([
        {"from": "Tube1", "to": "Tube3"},
        {"from": "Tube2", "to": "Tube1"}
    ])
}

fn solved_tubes() -> Value {
    json!([
        {"name": "Tube1", "colors": ["RED", "RED", null, null]},
        {"name": "Tube2", "colors": [null, null, null, null]},
        {"name": "Tube3", "colors": ["BLUE", "BLUE", null, null]}
    ])
}

async fn mount_solution(server: &MockServer, request: Value) {
    Mock::given(method("POST"))
        .and(path("/api/solve_puzzle"))
        .and(body_json(request))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "solution": two_step_solution()})),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn solution_runs_until_the_server_reports_completion() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;
    mount_solution(&server, json!({})).await;

    Mock::given(method("POST"))
        .and(path("/api/apply_move"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "tubes": moved_tubes()})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/apply_move"))
        .and(body_json(json!({"from_tube": "Tube2", "to_tube": "Tube1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "tubes": solved_tubes(),
            "game_completed": true,
            "final_move_list": two_step_solution()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = bootstrapped(&server).await;
    app.request_solution().await.unwrap();
    assert_eq!(app.solve_phase(), SolvePhase::SolutionReady);
    // Nothing runs until the user confirms.
    assert!(!app.has_pending());

    app.confirm_execute().unwrap();
    app.run_pending().await;

    assert_eq!(app.solve_phase(), SolvePhase::Idle);
    assert_eq!(
        app.board().unwrap().color_at(SlotCoord::new(2, 1)),
        Some(Color::Blue)
    );
    let events = app.take_events();
    assert!(events.contains(&ViewEvent::ExecutionStarted { steps: 2 }));
    assert!(events.contains(&ViewEvent::GameCompleted {
        final_moves: vec![Move::new("Tube1", "Tube3"), Move::new("Tube2", "Tube1")],
    }));
}

#[tokio::test]
async fn stopped_run_resumes_from_the_current_board() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;
    // The resume request carries the board left by the first step.
    mount_solution(&server, json!({"current_state": moved_tubes()})).await;
    mount_solution(&server, json!({})).await;

    Mock::given(method("POST"))
        .and(path("/api/apply_move"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "tubes": moved_tubes()})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = crate::common::app_for(&server);
    app.bootstrap().await;
    app.request_solution().await.unwrap();
    app.confirm_execute().unwrap();

    // First step is due immediately; the second waits out the pacing delay.
    assert_eq!(app.fire_due().await, 1);
    assert_eq!(app.solve_session().cursor(), Some(1));
    app.cancel_execution().await.unwrap();

    assert!(!app.has_pending());
    assert!(app.take_events().contains(&ViewEvent::ExecutionStopped {
        executed: 1,
        discarded: 1,
    }));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(app.fire_due().await, 0);

    app.request_solution().await.unwrap();
    assert_eq!(app.solve_phase(), SolvePhase::SolutionReady);
}

#[tokio::test]
async fn solver_failure_returns_to_idle() {
    let server = MockServer::start().await;
    mount_initial_state(&server).await;
    mount_top_moves(&server, one_move(), None).await;
    Mock::given(method("POST"))
        .and(path("/api/solve_puzzle"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "failure", "message": "No solution found"})),
        )
        .mount(&server)
        .await;

    let mut app = bootstrapped(&server).await;
    app.request_solution().await.unwrap();

    assert_eq!(app.solve_phase(), SolvePhase::Idle);
    assert!(app.take_events().contains(&ViewEvent::SolveFailed {
        reason: "No solution found".to_string(),
    }));
}
