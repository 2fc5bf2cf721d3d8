use super::*;
use httpmock::Method::POST;
use httpmock::MockServer;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

fn http_client() -> ClientWithMiddleware {
    ClientBuilder::new(Client::new()).build()
}

fn advisor_for(server: &MockServer) -> AdvisorClient {
    AdvisorClient::new_with_url(http_client(), server.url("/v1beta"), "gemini-test")
}

fn field() -> Field {
    Field {
        field_id: 1,
        user_id: "uid-1".to_string(),
        name: "North Paddock".to_string(),
        location: "Pune".to_string(),
        soil_type: None,
    }
}

fn candidate_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    })
}

#[tokio::test]
async fn crop_analysis_parses_fenced_structured_output() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    let crops = r#"```json
[
  {"name": "Wheat", "suitability": 88, "yield": "4.2t/ha", "requirements": "Cool season.", "fertilizer": "DAP", "icon": "fa-wheat-awn"},
  {"name": "Barley", "suitability": 71, "yield": "3.1t/ha", "requirements": "Drained soil.", "fertilizer": "Urea", "icon": "fa-seedling"},
  {"name": "Gram", "suitability": 65, "yield": "1.4t/ha", "requirements": "Low water.", "fertilizer": "SSP", "icon": "fa-leaf"}
]
```"#;

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .body_includes("Suggest 3 crops")
            .body_includes("responseSchema");
        then.status(200).json_body(candidate_body(crops));
    });

    let data = TelemetrySnapshot {
        moisture: Some(42.0),
        ..Default::default()
    };
    let fetched = advisor.crop_analysis(&field(), &data).await;
    assert!(!fetched.is_fallback());
    assert_eq!(fetched.value.len(), 3);
    assert_eq!(fetched.value[0].name, "Wheat");
    assert_eq!(fetched.value[0].expected_yield, "4.2t/ha");
    mock.assert();
}

#[tokio::test]
async fn crop_analysis_falls_back_on_unparseable_text() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(200)
            .json_body(candidate_body("Sorry, I cannot answer that."));
    });

    let data = TelemetrySnapshot {
        moisture: Some(12.0),
        ..Default::default()
    };
    let fetched = advisor.crop_analysis(&field(), &data).await;
    assert!(fetched.is_fallback());
    assert_eq!(fetched.value.len(), 3);
    assert_eq!(fetched.value[0].name, "Millets");
}

#[tokio::test]
async fn crop_analysis_falls_back_on_server_error() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(500).body("boom");
    });

    let fetched = advisor
        .crop_analysis(&field(), &TelemetrySnapshot::default())
        .await;
    assert!(fetched.is_fallback());
    assert_eq!(fetched.value.len(), 3);
    assert_eq!(fetched.value[0].name, "Hybrid Rice");
}

#[tokio::test]
async fn soil_health_summary_parses_structured_output() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    let insight = r#"{"summary": "Soil is compacted.", "soil_fertilizer": "Add gypsum."}"#;
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .body_includes("Soil Restoration Strategy");
        then.status(200).json_body(candidate_body(insight));
    });

    let fetched = advisor
        .soil_health_summary(&field(), &TelemetrySnapshot::default())
        .await;
    assert!(!fetched.is_fallback());
    assert_eq!(fetched.value.summary, "Soil is compacted.");
}

#[tokio::test]
async fn prescriptions_fall_back_when_no_candidates_returned() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(200).json_body(serde_json::json!({ "candidates": [] }));
    });

    let data = TelemetrySnapshot {
        moisture: Some(15.0),
        npk_n: Some(20.0),
        ..Default::default()
    };
    let fetched = advisor.management_prescriptions(&field(), &data).await;
    assert!(fetched.is_fallback());
    assert!(fetched.value.irrigation.needed);
    assert!(fetched.value.nutrient.needed);
    assert!(fetched.value.nutrient.fertilizers.is_empty());
}

#[tokio::test]
async fn roadmap_parses_structured_output() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    let steps = r#"[
        {"priority": "HIGH", "title": "Flush salts", "description": "Leach the topsoil.", "icon": "fa-droplet"}
    ]"#;
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .body_includes("Operational Roadmap");
        then.status(200).json_body(candidate_body(steps));
    });

    let data = TelemetrySnapshot {
        moisture: Some(42.0),
        ..Default::default()
    };
    let fetched = advisor.operational_roadmap(&field(), &data).await;
    assert!(!fetched.is_fallback());
    assert_eq!(fetched.value.len(), 1);
    assert_eq!(fetched.value[0].title, "Flush salts");
}

#[tokio::test]
async fn roadmap_falls_back_to_urgent_install_step() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(500).body("boom");
    });

    let fetched = advisor
        .operational_roadmap(&field(), &TelemetrySnapshot::default())
        .await;
    assert!(fetched.is_fallback());
    assert_eq!(fetched.value.len(), 1);
    assert_eq!(fetched.value[0].priority, "URGENT");
}

#[tokio::test]
async fn prompt_marks_missing_channels_offline() {
    let server = MockServer::start();
    let advisor = advisor_for(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .body_includes("BASELINE ESTIMATE ONLY")
            .body_includes("OFFLINE - DATA UNAVAILABLE")
            .body_includes("Soil Type: Loamy");
        then.status(200).json_body(candidate_body(
            r#"{"summary": "ok", "soil_fertilizer": "none"}"#,
        ));
    });

    advisor
        .soil_health_summary(&field(), &TelemetrySnapshot::default())
        .await;
    mock.assert();
}

#[test]
fn clean_and_parse_strips_fences() {
    let parsed: Vec<i64> = clean_and_parse("```json\n[1, 2, 3]\n```").unwrap();
    assert_eq!(parsed, vec![1, 2, 3]);

    let parsed: serde_json::Value = clean_and_parse(r#"{"a": 1}"#).unwrap();
    assert_eq!(parsed["a"], 1);

    assert!(clean_and_parse::<serde_json::Value>("not json").is_err());
}
