//! Полный цикл сессии через роутер без сети

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use passenger_ml::api::{router, ApiError, AppState};
use passenger_ml::config::AppConfig;
use passenger_ml::session::SessionError;

const TRAIN: &str = "\
PassengerId,HomePlanet,CryoSleep,Cabin,Destination,Age,VIP,RoomService,FoodCourt,ShoppingMall,Spa,VRDeck,Name,Transported
0001_01,Europa,False,B/0/P,TRAPPIST-1e,39.0,False,0.0,0.0,0.0,0.0,0.0,Maham Ofracculy,False
0002_01,Earth,False,F/0/S,TRAPPIST-1e,24.0,False,109.0,9.0,25.0,549.0,44.0,Juanna Vines,True
0003_01,Europa,False,A/0/S,TRAPPIST-1e,58.0,True,43.0,3576.0,0.0,6715.0,49.0,Altark Susent,False
0003_02,,False,,TRAPPIST-1e,33.0,False,0.0,1283.0,371.0,3329.0,193.0,Solam Susent,False
0004_01,Earth,,F/1/S,TRAPPIST-1e,16.0,False,0.0,0.0,0.0,0.0,0.0,Willy Santantines,True
";

const TEST: &str = "\
PassengerId,HomePlanet,CryoSleep,Cabin,Destination,Age,VIP,RoomService,FoodCourt,ShoppingMall,Spa,VRDeck,Name
0013_01,Earth,True,G/3/S,TRAPPIST-1e,27.0,False,0.0,0.0,0.0,0.0,0.0,Nelly Carsoning
0018_01,,False,F/4/S,TRAPPIST-1e,,False,0.0,9.0,0.0,2823.0,0.0,Lerome Peckers
";

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn health_and_banner() {
    let app = router(AppState::new(AppConfig::default()));
    let (status, body) = send(&app, "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");

    let (status, _) = send(&app, "GET", "/", "").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn session_lifecycle() {
    let app = router(AppState::new(AppConfig::default()));

    let (status, body) = send(&app, "POST", "/api/sessions", "").await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json(&body)["id"].as_u64().unwrap();
    let base = format!("/api/sessions/{id}");

    // До загрузки обеих партиций конвейер не запускается
    let (status, _) = send(&app, "POST", &format!("{base}/preprocess"), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "PUT", &format!("{base}/partitions/labeled"), TRAIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["rows"], 5);

    let (status, _) = send(&app, "PUT", &format!("{base}/partitions/unlabeled"), TEST).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("{base}/analyze"), "").await;
    assert_eq!(status, StatusCode::OK);
    let profile = json(&body);
    assert_eq!(profile["labeled"]["rows"], 5);
    assert_eq!(profile["unlabeled"]["rows"], 2);

    let (status, body) = send(&app, "POST", &format!("{base}/preprocess"), "").await;
    assert_eq!(status, StatusCode::OK);
    let report = json(&body);
    assert_eq!(report["labeled_rows"], 5);
    assert_eq!(report["unlabeled_rows"], 2);

    let (status, body) = send(&app, "GET", &format!("{base}/features/unlabeled"), "").await;
    assert_eq!(status, StatusCode::OK);
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("PassengerId,HomePlanet"));
    assert!(lines.next().unwrap().starts_with("0013_01,Earth,1,"));
    assert!(lines.next().unwrap().starts_with("0018_01,Earth,0,"));

    let (status, _) = send(&app, "GET", &format!("{base}/predictions"), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", &format!("{base}/model"), "").await;
    assert_eq!(status, StatusCode::OK);
    let run = json(&body);
    assert_eq!(run["predictions"].as_array().unwrap().len(), 2);
    assert_eq!(run["predictions"][0]["id"], "0013_01");

    let (status, body) = send(&app, "GET", &format!("{base}/predictions"), "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("PassengerId,Transported\n0013_01,"));

    let (status, body) = send(&app, "GET", &base, "").await;
    assert_eq!(status, StatusCode::OK);
    let summary = json(&body);
    assert_eq!(summary["preprocessed"], true);
    assert_eq!(summary["modeled"], true);

    let (status, _) = send(&app, "DELETE", &base, "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &base, "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_required_columns_is_rejected() {
    let app = router(AppState::new(AppConfig::default()));
    let (_, body) = send(&app, "POST", "/api/sessions", "").await;
    let id = json(&body)["id"].as_u64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/sessions/{id}/partitions/labeled"),
        "PassengerId,Age,Transported\n0001_01,30,True\n",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(&body)["error"].as_str().unwrap().contains("missing columns"));

    // Без идентификатора строки не читаются
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/sessions/{id}/partitions/labeled"),
        "HomePlanet,Age,Transported\nEarth,30,True\n",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(&body)["error"].as_str().unwrap().contains("PassengerId"));

    // Без колонки меток размеченная партиция не принимается
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/sessions/{id}/partitions/labeled"),
        TEST,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = router(AppState::new(AppConfig::default()));
    let (status, _) = send(&app, "GET", "/api/sessions/42/analyze", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn concurrent_change_is_a_conflict() {
    let error = ApiError::from(SessionError::Stale(3));
    assert_eq!(error.status(), StatusCode::CONFLICT);
    assert_eq!(
        ApiError::from(SessionError::NotPreprocessed).status(),
        StatusCode::BAD_REQUEST
    );
}
