//! Shared fixtures for the HTTP integration tests
#![allow(dead_code)]

use instance_healthcheck::admin::Instance;
use instance_healthcheck::api::{ApiClient, ResilienceConfig};
use instance_healthcheck::config::AdminApiSettings;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ADMIN_TOKEN_PATH: &str = "/connect/token";
pub const INSTANCE_TOKEN_PATH: &str = "/oauth/token";

/// Default retry budgets with millisecond backoff
pub fn fast_resilience() -> ResilienceConfig {
    ResilienceConfig::builder()
        .starting_delay(Duration::from_millis(1))
        .request_logging(false)
        .build()
}

pub fn api_client() -> ApiClient {
    ApiClient::new(&fast_resilience()).unwrap()
}

pub fn admin_settings(server: &MockServer) -> AdminApiSettings {
    let uri = server.uri();
    AdminApiSettings {
        access_token_url: format!("{}{}", uri, ADMIN_TOKEN_PATH),
        tenants_url: format!("{}/adminconsole/tenants", uri),
        instances_url: format!("{}/adminconsole/instances", uri),
        health_check_url: format!("{}/adminconsole/healthcheck", uri),
        username: "SomeUserName".to_string(),
        client_id: "SomeClientId".to_string(),
        client_secret: "SomeSecret".to_string(),
        password: "SomePassword".to_string(),
        grant_type: "client_credentials".to_string(),
        scope: "SomeScope".to_string(),
    }
}

pub fn instance(server: &MockServer, id: i64) -> Instance {
    let uri = server.uri();
    Instance {
        id,
        ods_instance_id: id,
        tenant_id: 1,
        tenant_name: "tenant1".to_string(),
        instance_name: format!("instance {}", id),
        client_id: "one client".to_string(),
        client_secret: "one secret".to_string(),
        resource_url: format!("{}/data/v3", uri),
        oauth_url: format!("{}{}", uri, INSTANCE_TOKEN_PATH),
        status: "Completed".to_string(),
    }
}

pub fn token_response(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": token,
        "expires_in": 1800,
        "token_type": "bearer"
    }))
}

pub async fn mount_token(server: &MockServer, token_path: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path(token_path))
        .respond_with(token_response(token))
        .mount(server)
        .await;
}

pub fn count_response(total: u64) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Total-Count", total.to_string().as_str())
        .set_body_string("[]")
}

pub fn endpoints(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
