// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete MiniMedi pipeline.
//!
//! Each test runs the conversation controller over the real HTTP client
//! (pointed at a wiremock server) and a temp SQLite database. Tests are
//! independent and order-insensitive.

use std::sync::Arc;

use minimedi_api::ApiClient;
use minimedi_config::MinimediConfig;
use minimedi_core::{RecordId, Turn};
use minimedi_intake::{ConversationController, ReconcileOutcome, TurnOutcome};
use minimedi_storage::SqlitePersistence;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const JOHN_REPLY: &str = "Thanks John, sorry to hear about the headache.\
###DATA_START###{\"name\":\"John\",\"age\":\"30\",\"gender\":\"male\",\"symptoms\":\"headache\",\"duration\":\"2\",\"complete\":false}###DATA_END###";

struct Env {
    server: MockServer,
    config: MinimediConfig,
    _dir: TempDir,
}

async fn env() -> Env {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = MinimediConfig::default();
    config.api.base_url = format!("{}/api", server.uri());
    config.api.retry_backoff_ms = 10;
    config.storage.database_path = dir.path().join("session.db").to_string_lossy().to_string();
    Env {
        server,
        config,
        _dir: dir,
    }
}

fn open_controller(env: &Env) -> ConversationController {
    let persistence = Arc::new(SqlitePersistence::open(&env.config.storage).unwrap());
    let client = Arc::new(ApiClient::new(&env.config.api).unwrap());
    ConversationController::from_config(&env.config, persistence, client.clone(), client)
}

async fn mount_reply(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/ai-check/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": reply })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn requests_to(requests: &[Request], verb: &str, url_path: &str) -> Vec<serde_json::Value> {
    requests
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == url_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn intake_turn_creates_record_then_patches_it() {
    let env = env().await;
    mount_reply(&env.server, JOHN_REPLY).await;
    mount_reply(
        &env.server,
        "Got it, three days.###DATA_START###{\"duration\":\"3\"}###DATA_END###",
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 41 })))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/symptoms/41/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 41 })))
        .expect(1)
        .mount(&env.server)
        .await;

    let controller = open_controller(&env);
    let outcome = controller
        .submit("John, 30, male, headache, 2 days")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Replied {
            reply: "Thanks John, sorry to hear about the headache.".to_string(),
            reconciling: true,
        }
    );
    controller.flush().await;
    assert_eq!(controller.cached_record_id().await, Some(RecordId::from("41")));

    controller.submit("it's been 3 days now").await.unwrap();
    controller.flush().await;

    let requests = env.server.received_requests().await.unwrap();

    let creates = requests_to(&requests, "POST", "/api/symptoms/");
    assert_eq!(creates.len(), 1);
    let create = &creates[0];
    assert_eq!(create["patient_name"], "John");
    assert_eq!(create["age"], 30);
    assert_eq!(create["gender"], "male");
    assert_eq!(create["description"], "headache");
    assert_eq!(create["duration"], 2);
    assert_eq!(create["severity"], "MEDIUM");
    assert_eq!(create["title"], "Health Analysis Report");
    let risk = create["risk_score"].as_u64().unwrap();
    assert!((20..=59).contains(&risk));

    let patches = requests_to(&requests, "PATCH", "/api/symptoms/41/");
    assert_eq!(patches.len(), 1);
    let patch = patches[0].as_object().unwrap();
    assert_eq!(patch.len(), 2, "patch body: {patch:?}");
    assert_eq!(patch["duration"], 3);
    assert_eq!(
        patch["ai_analysis"],
        format!(
            "{}\n\nThanks John, sorry to hear about the headache.\n\nGot it, three days.",
            env.config.session.greeting
        )
    );

    let model_calls = requests_to(&requests, "POST", "/api/ai-check/");
    assert_eq!(model_calls.len(), 2);
    assert_eq!(
        model_calls[1]["messages"][2],
        json!({"role": "assistant", "content": "Thanks John, sorry to hear about the headache."})
    );
}

#[tokio::test]
async fn session_survives_restart() {
    let env = env().await;
    mount_reply(&env.server, JOHN_REPLY).await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "abc" })))
        .mount(&env.server)
        .await;

    {
        let first = open_controller(&env);
        first.submit("John, 30, male, headache, 2 days").await.unwrap();
        first.flush().await;
    }

    let restarted = open_controller(&env);
    let transcript = restarted.transcript().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1], Turn::user("John, 30, male, headache, 2 days"));
    assert_eq!(restarted.cached_record_id().await, Some(RecordId::from("abc")));
}

#[tokio::test]
async fn reset_sends_one_final_update_and_clears_storage() {
    let env = env().await;
    mount_reply(&env.server, JOHN_REPLY).await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .mount(&env.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/symptoms/7/"))
        .and(body_json(json!({
            "ai_analysis": format!(
                "{}\n\nThanks John, sorry to hear about the headache.",
                MinimediConfig::default().session.greeting
            )
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&env.server)
        .await;

    let controller = open_controller(&env);
    controller.submit("John").await.unwrap();

    assert_eq!(controller.reset().await, ReconcileOutcome::Updated(RecordId::from("7")));
    assert_eq!(controller.cached_record_id().await, None);

    let restarted = open_controller(&env);
    assert_eq!(
        restarted.transcript().await,
        vec![Turn::assistant(env.config.session.greeting.clone())]
    );
    assert_eq!(restarted.cached_record_id().await, None);
}

#[tokio::test]
async fn model_outage_yields_fallback_turn() {
    let env = env().await;
    Mock::given(method("POST"))
        .and(path("/api/ai-check/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&env.server)
        .await;

    let controller = open_controller(&env);
    let outcome = controller.submit("hello").await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Fallback {
            reply: env.config.session.fallback_reply.clone(),
        }
    );

    let requests = env.server.received_requests().await.unwrap();
    // One attempt plus one retry; no record writes.
    assert_eq!(requests_to(&requests, "POST", "/api/ai-check/").len(), 2);
    assert!(requests_to(&requests, "POST", "/api/symptoms/").is_empty());
}

#[tokio::test]
async fn deleted_record_is_recreated() {
    let env = env().await;
    mount_reply(&env.server, JOHN_REPLY).await;
    mount_reply(
        &env.server,
        "Thanks.###DATA_START###{\"symptoms\":\"migraine\"}###DATA_END###",
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .up_to_n_times(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 2 })))
        .mount(&env.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/symptoms/1/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": "Symptom not found or unauthorized" })),
        )
        .mount(&env.server)
        .await;

    let controller = open_controller(&env);
    controller.submit("John").await.unwrap();
    controller.flush().await;
    controller.submit("it's more of a migraine").await.unwrap();
    controller.flush().await;

    assert_eq!(controller.cached_record_id().await, Some(RecordId::from("2")));
    let requests = env.server.received_requests().await.unwrap();
    let creates = requests_to(&requests, "POST", "/api/symptoms/");
    assert_eq!(creates.len(), 2);
    assert_eq!(creates[1]["description"], "migraine");
    assert_eq!(creates[1]["patient_name"], "Guest");
}

#[tokio::test]
async fn history_lists_and_deletes_session_record() {
    let env = env().await;
    mount_reply(&env.server, JOHN_REPLY).await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 41 })))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 41, "patient_name": "John", "severity": "MEDIUM", "risk_score": 33 },
            { "id": 3, "patient_name": "Guest", "severity": "LOW", "risk_score": 0 }
        ])))
        .mount(&env.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/symptoms/41/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&env.server)
        .await;

    let controller = open_controller(&env);
    controller.submit("John").await.unwrap();

    let history = controller.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, RecordId::from("41"));
    assert_eq!(controller.cached_record_id().await, Some(RecordId::from("41")));

    controller.delete_record(&RecordId::from("41")).await.unwrap();
    assert_eq!(controller.cached_record_id().await, None);

    let restarted = open_controller(&env);
    assert_eq!(restarted.cached_record_id().await, None);
    assert_eq!(restarted.transcript().await.len(), 3);
}

#[tokio::test]
async fn clear_all_drops_cached_record() {
    let env = env().await;
    mount_reply(&env.server, JOHN_REPLY).await;
    Mock::given(method("POST"))
        .and(path("/api/symptoms/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 8 })))
        .mount(&env.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/symptoms/clear-all/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "All symptoms cleared successfully",
            "deleted_count": 3
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let controller = open_controller(&env);
    controller.submit("John").await.unwrap();
    assert_eq!(controller.clear_records().await.unwrap(), 3);
    assert_eq!(controller.cached_record_id().await, None);

    let requests = env.server.received_requests().await.unwrap();
    assert!(requests_to(&requests, "PATCH", "/api/symptoms/8/").is_empty());
}
