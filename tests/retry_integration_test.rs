use std::time::Duration;

use apicase::http::{Client, Request};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 测试 503 响应触发重试，恢复后拿到成功响应
#[tokio::test]
async fn test_retry_on_server_error_then_success() {
    let mock_server = MockServer::start().await;

    // 前两次返回 503，之后返回 200
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new(Duration::from_secs(5), 3).unwrap();
    let request = Request::new("GET", &format!("{}/flaky", mock_server.uri())).unwrap();

    let response = client.execute(&request).await.unwrap();
    assert_eq!(response.status.code(), 200);
    assert_eq!(response.body, "recovered");
}

/// 测试重试次数耗尽后返回最后一次的失败响应
#[tokio::test]
async fn test_retry_exhausted_returns_last_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = Client::new(Duration::from_secs(5), 2).unwrap();
    let request = Request::new("GET", &format!("{}/down", mock_server.uri())).unwrap();

    // 重试耗尽不报错，把 503 响应交给断言层
    let response = client.execute(&request).await.unwrap();
    assert_eq!(response.status.code(), 503);
}

/// 测试非重试状态码（404）不触发重试
#[tokio::test]
async fn test_client_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new(Duration::from_secs(5), 3).unwrap();
    let request = Request::new("GET", &format!("{}/missing", mock_server.uri())).unwrap();

    let response = client.execute(&request).await.unwrap();
    assert_eq!(response.status.code(), 404);
}
