mod common;

use awas::config::Config;
use common::{app_with, offline_config, send};
use hyper::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn assistant_without_key_is_unavailable() {
    let app = app_with(&offline_config());
    let (status, body) = send(&app, "POST", "/api/assistant", Some(json!({"question": "Is it safe?"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("not configured"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/action-plan",
        Some(json!({"location": "Jakarta", "weather": "rain", "situation": "march"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let config = Config {
        chat_api_key: Some("test-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);
    let (status, _) = send(&app, "POST", "/api/assistant", Some(json!({"question": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn answer_includes_search_sources() {
    let search = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "protest near city hall"))
        .and(query_param("cx", "engine-1"))
        .and(query_param("num", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"title": "March downtown", "link": "https://news.test/a", "snippet": "Thousands expected"},
                {"title": "Road closures", "link": "https://news.test/b", "snippet": "Avoid Main St"}
            ]
        })))
        .expect(1)
        .mount(&search)
        .await;

    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo", "max_tokens": 300})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("- **Summary**: a march")))
        .expect(1)
        .mount(&chat)
        .await;

    let config = Config {
        search_url: search.uri(),
        search_api_key: Some("search-key".to_string()),
        search_engine_id: Some("engine-1".to_string()),
        chat_url: chat.uri(),
        chat_api_key: Some("test-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/assistant",
        Some(json!({"question": " protest near city hall "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "- **Summary**: a march");
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);
    assert_eq!(body["sources"][1]["link"], "https://news.test/b");
}

#[tokio::test]
async fn failed_search_still_answers_without_sources() {
    let search = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&search)
        .await;
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&chat)
        .await;

    let config = Config {
        search_url: search.uri(),
        search_api_key: Some("search-key".to_string()),
        search_engine_id: Some("engine-1".to_string()),
        chat_url: chat.uri(),
        chat_api_key: Some("test-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(&app, "POST", "/api/assistant", Some(json!({"question": "today?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Unable to get response.");
    assert_eq!(body["sources"], json!([]));
}

#[tokio::test]
async fn chat_error_is_a_bad_gateway() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&chat)
        .await;
    let config = Config {
        chat_url: chat.uri(),
        chat_api_key: Some("test-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, _) = send(&app, "POST", "/api/assistant", Some(json!({"question": "today?"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn action_plan_is_returned_as_text() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{"role": "system", "content": "You are a civic safety assistant."}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("- [ ] Water\n- [ ] ID card")))
        .expect(1)
        .mount(&chat)
        .await;
    let config = Config {
        chat_url: chat.uri(),
        chat_api_key: Some("test-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/action-plan",
        Some(json!({"location": "Jakarta", "weather": "rain", "situation": "student march"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "- [ ] Water\n- [ ] ID card");
}

#[tokio::test]
async fn forecast_combines_weather_and_traffic() {
    let weather = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "-6.1751"))
        .and(query_param("appid", "weather-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{"main": "Rain", "description": "light rain"}],
            "main": {"temp": 28.0}
        })))
        .mount(&weather)
        .await;
    let traffic = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/traffic/services/4/flowSegmentData/absolute/10/json"))
        .and(query_param("key", "traffic-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flowSegmentData": {"currentSpeed": 20.0, "freeFlowSpeed": 50.0}
        })))
        .mount(&traffic)
        .await;

    let config = Config {
        weather_url: weather.uri(),
        weather_api_key: Some("weather-key".to_string()),
        traffic_url: traffic.uri(),
        traffic_api_key: Some("traffic-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(&app, "GET", "/api/forecast", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Unknown");
    assert_eq!(body["weather"]["condition"], "rainy");
    assert_eq!(body["weather"]["description"], "light rain");
    assert_eq!(body["traffic"]["density"], "medium");
    assert_eq!(body["traffic"]["avg_delay"], 6);
    assert_eq!(body["risk_score"], 5);
    assert_eq!(body["risk_level"], "Medium");
    let tips = body["recommendations"].as_array().unwrap();
    assert_eq!(tips.len(), 4);
    assert_eq!(tips[3], "Bring waterproof gear");
}

#[tokio::test]
async fn forecast_degrades_when_providers_fail() {
    let weather = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&weather)
        .await;
    let config = Config {
        weather_url: weather.uri(),
        weather_api_key: Some("weather-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(&app, "GET", "/api/forecast", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weather"]["available"], false);
    assert_eq!(body["weather"]["description"], "Weather data not available");
    assert_eq!(body["traffic"]["available"], false);
    assert_eq!(body["risk_score"], 3);
    assert_eq!(body["risk_level"], "Low");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn demonstrations_are_filtered_and_sorted_by_distance() {
    let app = app_with(&offline_config());

    let (status, body) = send(
        &app,
        "GET",
        "/api/demonstrations?lat=40.758&lon=-73.9855&radius_km=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["Climate Action Rally", "Housing Justice Demonstration", "Workers Rights March"]
    );

    let (_, body) = send(&app, "GET", "/api/demonstrations?lat=40.758&lon=-73.9855", None).await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, _) = send(&app, "GET", "/api/demonstrations?lat=91&lon=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "GET",
        "/api/demonstrations?lat=40.758&lon=-73.9855&radius_km=-1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn news_article(title: &str, description: &str, url: &str, published_at: &str, source: &str) -> serde_json::Value {
    json!({
        "source": {"id": null, "name": source},
        "author": null,
        "title": title,
        "description": description,
        "url": url,
        "publishedAt": published_at
    })
}

#[tokio::test]
async fn city_reports_are_filtered_deduplicated_and_analyzed() {
    let news = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("apiKey", "news-key"))
        .and(query_param("language", "en"))
        .and(query_param("sortBy", "publishedAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "articles": [
                news_article(
                    "Jakarta students rally outside parliament",
                    "Police fired tear gas as clashes broke out",
                    "https://news.test/1",
                    "2026-10-17T08:00:00Z",
                    "Wire"
                ),
                news_article(
                    "Peaceful vigil in Jakarta",
                    "A calm evening gathering",
                    "https://news.test/2",
                    "2026-10-18T19:30:00Z",
                    "Daily"
                ),
                news_article(
                    "Bangkok protest grows",
                    "Thousands march",
                    "https://news.test/3",
                    "2026-10-18T10:00:00Z",
                    "Wire"
                )
            ]
        })))
        // One query per search term, for each of the two requests below.
        .expect(6)
        .mount(&news)
        .await;

    let config = Config {
        news_url: news.uri(),
        news_api_key: Some("news-key".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(&app, "GET", "/api/demonstrations/reports?city=Jakarta", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Jakarta");
    let reports = body["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["url"], "https://news.test/2");
    assert_eq!(reports[0]["sentiment"], 1.0);
    assert_eq!(reports[0]["author"], "unknown");
    assert_eq!(reports[1]["sentiment"], -1.0);
    assert_eq!(body["analysis"]["sentiment"]["positive"], 1);
    assert_eq!(body["analysis"]["sentiment"]["negative"], 1);

    let (_, body) = send(
        &app,
        "GET",
        "/api/demonstrations/reports?city=Jakarta&keywords=Police,%20arrest",
        None,
    )
    .await;
    assert_eq!(body["filtered_by"], json!(["police", "arrest"]));
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);
    assert_eq!(body["reports"][0]["source"], "Wire");
}

#[tokio::test]
async fn city_reports_degrade_to_empty() {
    let news = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&news)
        .await;
    let config = Config {
        news_url: news.uri(),
        news_api_key: Some("revoked".to_string()),
        ..offline_config()
    };
    let app = app_with(&config);

    let (status, body) = send(&app, "GET", "/api/demonstrations/reports?city=Jakarta", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reports"], json!([]));
    assert_eq!(body["analysis"]["total"], 0);

    let unconfigured = app_with(&offline_config());
    let (status, body) = send(&unconfigured, "GET", "/api/demonstrations/reports?city=Jakarta", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reports"], json!([]));

    let (status, _) = send(&unconfigured, "GET", "/api/demonstrations/reports?city=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
