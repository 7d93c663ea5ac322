use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::spawn_app;

#[tokio::test]
async fn an_error_is_shown_on_failure() {
    // arrange
    let app = spawn_app().await;

    // act
    let login_body = serde_json::json!({
        "email": &app.test_user.email,
        "password": "random-password",
    });
    let response = app.post_login(&login_body).await;

    // assert
    assert_eq!(response.status().as_u16(), 401);
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(r#"<p class="error"><i>Authentication failed</i></p>"#));
}

#[tokio::test]
async fn unknown_emails_fail_the_same_way() {
    let app = spawn_app().await;

    let login_body = serde_json::json!({
        "email": "nobody@example.com",
        "password": "random-password",
    });
    let response = app.post_login(&login_body).await;

    assert_eq!(response.status().as_u16(), 401);
    assert!(response.text().await.unwrap().contains("Authentication failed"));
}

#[tokio::test]
async fn the_application_is_served_after_login_success() {
    // arrange
    let app = spawn_app().await;

    // act
    let login_body = serde_json::json!({
        "email": &app.test_user.email,
        "password": &app.test_user.password,
    });
    let response = app.post_login(&login_body).await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("window.bootstrapData = {"));
    assert!(html_page.contains(&format!(r#""id":"{}""#, app.test_user.user_id)));
    assert!(html_page.contains(&format!(r#""serverUrl":"{}""#, app.address)));
}

#[tokio::test]
async fn emailed_login_links_log_the_user_in() {
    // arrange
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // act 1: ask for a link
    let response = app.post_login_email(&app.test_user.email).await;
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("A login link is on its way"));

    // act 2: follow it
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let links = app.get_email_links(email_request);
    let response = app.get(links.html).await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains(&format!(r#""email":"{}""#, app.test_user.email)));
}

#[tokio::test]
async fn no_link_is_sent_to_unknown_addresses() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_login_email("nobody@example.com").await;

    // the reply does not reveal whether the address is registered
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("A login link is on its way"));
}

#[tokio::test]
async fn a_forged_login_link_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(&format!("{}/login/not.a.token", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 401);
    assert!(response.text().await.unwrap().contains("invalid or has expired"));
}
