use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cricket_scorer::build_router;
use cricket_scorer::state::AppState;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

struct Fixture {
    app: Router,
    match_id: String,
    lions: Vec<String>,
    tigers: Vec<String>,
}

async fn add_player(app: &Router, match_id: &str, name: &str, side: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/matches/{}/players", match_id),
        Some(json!({ "name": name, "side": side })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["_id"].as_str().unwrap().to_string()
}

/// One-over match with three players a side and the toss done.
async fn fixture() -> Fixture {
    let app = build_router(AppState::in_memory());

    let (status, body) = send(
        &app,
        "POST",
        "/api/matches",
        Some(json!({ "team_a": "Lions", "team_b": "Tigers", "overs_per_innings": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let match_id = body["data"]["_id"].as_str().unwrap().to_string();

    let mut lions = Vec::new();
    for name in ["Asha", "Bilal", "Chidi"] {
        lions.push(add_player(&app, &match_id, name, "team_a").await);
    }
    let mut tigers = Vec::new();
    for name in ["Xavi", "Yusuf", "Zane"] {
        tigers.push(add_player(&app, &match_id, name, "team_b").await);
    }

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/matches/{}/toss", match_id),
        Some(json!({ "winner": "team_a", "decision": "bat" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    Fixture { app, match_id, lions, tigers }
}

async fn start_innings(f: &Fixture, side: &str) -> String {
    let (status, body) = send(
        &f.app,
        "POST",
        &format!("/api/matches/{}/innings", f.match_id),
        Some(json!({ "batting_side": side })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn start_over(f: &Fixture, innings_id: &str, number: u32, bowler: &str) -> String {
    let (status, body) = send(
        &f.app,
        "POST",
        &format!("/api/innings/{}/overs", innings_id),
        Some(json!({ "over_number": number, "bowler_id": bowler })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn ball(f: &Fixture, innings_id: &str, delivery: Value) -> (StatusCode, Value) {
    send(&f.app, "POST", &format!("/api/innings/{}/balls", innings_id), Some(delivery)).await
}

#[tokio::test]
async fn health_reports_the_store() {
    let app = build_router(AppState::in_memory());
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
    assert_eq!(body["config"]["recent_balls_window"], 12);
}

#[tokio::test]
async fn innings_cannot_start_before_the_toss() {
    let app = build_router(AppState::in_memory());
    let (_, body) = send(
        &app,
        "POST",
        "/api/matches",
        Some(json!({ "team_a": "Lions", "team_b": "Tigers", "overs_per_innings": 20 })),
    )
    .await;
    let match_id = body["data"]["_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/matches/{}/innings", match_id),
        Some(json!({ "batting_side": "team_a" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid state");
}

#[tokio::test]
async fn full_match_through_to_the_winner() {
    let f = fixture().await;
    let (a, b) = (f.lions[0].clone(), f.lions[1].clone());

    let first = start_innings(&f, "team_a").await;
    let (_, summary) = send(&f.app, "GET", &format!("/api/matches/{}", f.match_id), None).await;
    assert_eq!(summary["data"]["match"]["status"], "live");
    assert_eq!(summary["data"]["current_innings_id"], first.as_str());

    let over = start_over(&f, &first, 1, &f.tigers[0]).await;
    let deliveries = [
        json!({ "over_id": over, "striker_id": a, "non_striker_id": b, "runs_off_bat": 4 }),
        json!({ "over_id": over, "striker_id": a, "non_striker_id": b, "runs_off_bat": 1 }),
        json!({ "over_id": over, "striker_id": b, "non_striker_id": a, "extras_type": "Wide", "extras_runs": 1 }),
        json!({ "over_id": over, "striker_id": b, "non_striker_id": a, "runs_off_bat": 0 }),
        json!({ "over_id": over, "striker_id": b, "non_striker_id": a, "runs_off_bat": 6 }),
        json!({ "over_id": over, "striker_id": b, "non_striker_id": a, "runs_off_bat": 0 }),
    ];
    let mut tokens = Vec::new();
    for delivery in deliveries {
        let (status, body) = ball(&f, &first, delivery).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        tokens.push(body["data"]["display_token"].as_str().unwrap().to_string());
    }
    assert_eq!(tokens, vec!["4", "1", "1wd", "•", "6", "•"]);

    let last = json!({ "over_id": over, "striker_id": b, "non_striker_id": a, "runs_off_bat": 2 });
    let (status, body) = ball(&f, &first, last.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["innings_completed"], true);
    assert_eq!(body["data"]["total_runs"], 14);
    assert_eq!(body["message"], "Innings completed");

    let (_, current) = send(&f.app, "GET", &format!("/api/matches/{}/innings/current", f.match_id), None).await;
    assert!(current["data"].is_null());
    let (_, summary) = send(&f.app, "GET", &format!("/api/matches/{}", f.match_id), None).await;
    assert_eq!(summary["data"]["match"]["status"], "innings_break");

    // Undo reopens the innings while the chase has not begun
    let (status, body) = send(&f.app, "DELETE", &format!("/api/innings/{}/balls/last", first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_completed"], false);
    assert_eq!(body["data"]["total_runs"], 12);
    let (_, summary) = send(&f.app, "GET", &format!("/api/matches/{}", f.match_id), None).await;
    assert_eq!(summary["data"]["match"]["status"], "live");

    let (status, _) = ball(&f, &first, last).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, recent) = send(&f.app, "GET", &format!("/api/innings/{}/balls/recent?limit=3", first), None).await;
    let recent = recent["data"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["display_token"], "2");
    assert_eq!(recent[2]["display_token"], "6");

    let (_, card) = send(&f.app, "GET", &format!("/api/innings/{}/scorecard", first), None).await;
    let card = &card["data"];
    assert_eq!(card["summary"]["score"], "14/0");
    assert_eq!(card["batting"][0]["name"], "Asha");
    assert_eq!(card["batting"][0]["runs"], 5);
    assert_eq!(card["batting"][1]["runs"], 8);
    assert_eq!(card["bowling"][0]["runs"], 14);
    assert_eq!(card["bowling"][0]["wides"], 1);
    assert_eq!(card["extras"]["total"], 1);
    assert_eq!(card["yet_to_bat"], json!(["Chidi"]));

    let second = start_innings(&f, "team_b").await;
    let (status, _) = send(
        &f.app,
        "POST",
        &format!("/api/matches/{}/innings", f.match_id),
        Some(json!({ "batting_side": "team_b" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The first innings cannot be reopened once the chase is under way
    let (status, _) = send(&f.app, "DELETE", &format!("/api/innings/{}/balls/last", first), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (x, y) = (f.tigers[0].clone(), f.tigers[1].clone());
    let over = start_over(&f, &second, 1, &f.lions[2]).await;
    for runs in [6, 6] {
        let delivery = json!({ "over_id": over, "striker_id": x, "non_striker_id": y, "runs_off_bat": runs });
        let (_, body) = ball(&f, &second, delivery).await;
        assert_eq!(body["data"]["innings_completed"], false);
    }
    let (_, summary) = send(&f.app, "GET", &format!("/api/matches/{}", f.match_id), None).await;
    assert_eq!(summary["data"]["chase"]["target"], 15);
    assert_eq!(summary["data"]["chase"]["runs_needed"], 3);
    assert_eq!(summary["data"]["chase"]["balls_remaining"], 4);

    let delivery = json!({ "over_id": over, "striker_id": x, "non_striker_id": y, "runs_off_bat": 4 });
    let (_, body) = ball(&f, &second, delivery).await;
    assert_eq!(body["data"]["innings_completed"], true);

    let (_, summary) = send(&f.app, "GET", &format!("/api/matches/{}", f.match_id), None).await;
    let data = &summary["data"];
    assert_eq!(data["projected_result"]["kind"], "won");
    assert_eq!(data["projected_result"]["side"], "team_b");
    assert_eq!(data["projected_result"]["margin"]["wickets"], 10);
    assert_eq!(data["result_text"], "Tigers won by 10 wickets");
    assert!(data["winner"].is_null());

    let (status, body) = send(
        &f.app,
        "PUT",
        &format!("/api/matches/{}/winner", f.match_id),
        Some(json!({ "winner": "team_b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["message"], "Tigers won");

    let (_, summary) = send(&f.app, "GET", &format!("/api/matches/{}", f.match_id), None).await;
    assert_eq!(summary["data"]["winner_team"], "Tigers");
}

#[tokio::test]
async fn malformed_deliveries_are_rejected() {
    let f = fixture().await;
    let innings = start_innings(&f, "team_a").await;
    let over = start_over(&f, &innings, 1, &f.tigers[0]).await;
    let (a, b) = (f.lions[0].clone(), f.lions[1].clone());

    let (status, body) = ball(&f, &innings, json!({ "over_id": over, "striker_id": "", "non_striker_id": b })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");

    let too_many = json!({ "over_id": over, "striker_id": a, "non_striker_id": b, "runs_off_bat": 11 });
    let (status, _) = ball(&f, &innings, too_many).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bowler_batting = json!({ "over_id": over, "striker_id": f.tigers[1], "non_striker_id": b });
    let (status, _) = ball(&f, &innings, bowler_batting).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = json!({ "over_id": over, "striker_id": "ghost", "non_striker_id": b });
    let (status, _) = ball(&f, &innings, unknown).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, detail) = send(&f.app, "GET", &format!("/api/innings/{}", innings), None).await;
    assert_eq!(detail["data"]["summary"]["balls_bowled"], 0);
}

#[tokio::test]
async fn bowler_correction_and_retirements() {
    let f = fixture().await;
    let innings = start_innings(&f, "team_a").await;
    let over = start_over(&f, &innings, 1, &f.tigers[0]).await;

    let (status, body) = send(
        &f.app,
        "PUT",
        &format!("/api/overs/{}/bowler", over),
        Some(json!({ "bowler_id": f.tigers[1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bowler_id"], f.tigers[1].as_str());

    let (status, _) = send(
        &f.app,
        "PUT",
        "/api/overs/missing/bowler",
        Some(json!({ "bowler_id": f.tigers[1] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &f.app,
        "POST",
        &format!("/api/innings/{}/retirements", innings),
        Some(json!({ "player_id": f.lions[0], "reason": "hamstring" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["reason"], "hamstring");

    let (_, list) = send(&f.app, "GET", &format!("/api/innings/{}/retirements", innings), None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let app = build_router(AppState::in_memory());

    let (status, body) = send(&app, "GET", "/api/innings/nope/scorecard", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/matches/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/innings/nope/balls/last", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
