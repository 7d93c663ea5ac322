use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::spawn_app;

#[tokio::test]
async fn preflight_requests_are_answered_locally() {
    // arrange
    let app = spawn_app().await;
    Mock::given(method("OPTIONS"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.graphql_server)
        .await;

    // act
    let response = app
        .api_client
        .request(
            reqwest::Method::OPTIONS,
            &format!("{}/v1/graphql", &app.address),
        )
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let headers = response.headers();
    assert_eq!(headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(headers["Access-Control-Allow-Credentials"], "true");
    assert_eq!(headers["Content-Type"], "application/json");
}

#[tokio::test]
async fn graphql_requests_are_forwarded_to_the_engine() {
    // arrange
    let app = spawn_app().await;
    let query = r#"{"query":"{ users { id } }"}"#;
    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(header("authorization", "Bearer a-token"))
        .and(body_string(query))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"users":[]}}"#))
        .expect(1)
        .mount(&app.graphql_server)
        .await;

    // act
    let response = app
        .api_client
        .post(&format!("{}/v1/graphql", &app.address))
        .header("authorization", "Bearer a-token")
        .body(query)
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
    assert_eq!(response.text().await.unwrap(), r#"{"data":{"users":[]}}"#);
}

#[tokio::test]
async fn subpaths_under_the_graphql_path_are_forwarded() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/v1/graphql/schema"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.graphql_server)
        .await;

    let response = app
        .api_client
        .get(&format!("{}/v1/graphql/schema", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn proxied_requests_never_open_a_transaction() {
    // arrange
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.graphql_server)
        .await;
    // without a database the page routes fail, the graphql path must not care
    app.connection_pool.close().await;

    // act
    let response = app
        .api_client
        .post(&format!("{}/v1/graphql", &app.address))
        .body("{}")
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
}

#[tokio::test]
async fn paths_that_only_share_a_prefix_are_not_proxied() {
    let app = spawn_app().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.graphql_server)
        .await;

    let response = app
        .api_client
        .get(&format!("{}/v1/graphqlfoo", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("<h1>Not Found</h1>"));
}

#[tokio::test]
async fn large_request_bodies_are_forwarded() {
    // arrange
    let app = spawn_app().await;
    let payload = "a".repeat(300 * 1024);
    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(body_string(payload.clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.graphql_server)
        .await;

    // act
    let response = app
        .api_client
        .post(&format!("{}/v1/graphql", &app.address))
        .body(payload)
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(response.status().as_u16(), 200);
}
