//! End-to-end tests against the live echo server.
//!
//! # Design
//! Each test starts the echo server on a random port and drives the ureq
//! transport through the public client API. The server reflects what it
//! received, so the assertions check what actually went over the wire.

use std::net::SocketAddr;

use curlish_core::{Client, FileRef, Header, Method, RequestError, SecretString, DEFAULT_USER_AGENT};
use mock_server::Echo;

/// Start the echo server on a random port and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn echo_of(resp: &curlish_core::ResponseSnapshot) -> Echo {
    assert_eq!(resp.error_code(), 0, "transport error: {}", resp.error_message());
    serde_json::from_slice(resp.body().expect("body captured")).unwrap()
}

#[test]
fn get_returns_body_status_and_info() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();

    let resp = client.get(&[Header::from("X-Trace: 42")]).unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.is_success());
    assert_eq!(resp.info()["url"], format!("http://{addr}/echo"));
    assert_eq!(resp.info()["content_type"], "application/json");
    assert!(resp.response_time() >= 0.0);

    let echo = echo_of(&resp);
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.header("x-trace"), Some("42"));
    assert_eq!(echo.header("user-agent"), Some(DEFAULT_USER_AGENT));
}

#[test]
fn large_body_is_captured_whole() {
    const SIZE: usize = 12 * 1024 * 1024;
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/bytes/{SIZE}")).unwrap();
    client.set_timeout(30).unwrap();

    let resp = client.get(&[]).unwrap();

    assert_eq!(resp.error_code(), 0, "{}", resp.error_message());
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body().map(|b| b.len()), Some(SIZE));
    assert_eq!(resp.info()["size_download"], SIZE);
}

#[test]
fn post_sends_urlencoded_fields() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();

    let resp = client
        .post(&[("f1", "12345"), ("f2", "test")], &[], &[Header::from("testheader: 123")])
        .unwrap();

    let echo = echo_of(&resp);
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "f1=12345&f2=test");
    assert_eq!(echo.header("content-type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(echo.header("testheader"), Some("123"));
}

#[test]
fn verbs_reach_server_with_overridden_method() {
    let addr = start_server();
    let url = format!("http://{addr}/echo");

    let mut client = Client::open(&url).unwrap();
    assert_eq!(echo_of(&client.put(&[("a", "1")], &[], &[]).unwrap()).method, "PUT");

    let mut client = Client::open(&url).unwrap();
    let echo = echo_of(&client.patch(&[("a", "1")], &[], &[]).unwrap());
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.body, "a=1");

    let mut client = Client::open(&url).unwrap();
    assert_eq!(echo_of(&client.delete(&[], &[], &[]).unwrap()).method, "DELETE");
}

#[test]
fn json_sends_document_and_headers() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();
    let data = serde_json::json!({"name": "foo", "surname": "bar"});

    let echo = echo_of(&client.json(&data, Method::Patch).unwrap());

    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.header("content-type"), Some("application/json"));
    assert_eq!(echo.header("accept"), Some("application/json"));
    let sent: serde_json::Value = serde_json::from_str(&echo.body).unwrap();
    assert_eq!(sent, data);
}

#[test]
fn json_with_delete_goes_out_as_post() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();

    let echo = echo_of(&client.json(&serde_json::json!([1, 2]), Method::Delete).unwrap());

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "[1,2]");
}

#[test]
fn bearer_token_reaches_server() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();

    let resp = client
        .set_bearer_auth(SecretString::new("super-secret-token".into()))
        .post(&[("a", "1")], &[], &[])
        .unwrap();

    let echo = echo_of(&resp);
    assert_eq!(echo.header("authorization"), Some("Bearer super-secret-token"));
}

#[test]
fn binary_body_arrives_intact() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();
    let data = "zażółć gęślą jaźń";

    let echo = echo_of(&client.binary(data, &[]).unwrap());

    assert_eq!(echo.body, data);
    assert_eq!(echo.header("content-type"), Some("application/octet-stream"));
    assert_eq!(echo.header("content-length"), Some(data.len().to_string().as_str()));
}

#[test]
fn parameters_then_request_posts_them() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();

    client.set_parameters(&[("a", 1), ("b", 2)]).unwrap();
    let echo = echo_of(&client.request().unwrap());

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "a=1&b=2");
}

#[test]
fn multipart_upload_carries_file() {
    let addr = start_server();
    let dir = std::env::temp_dir().join(format!("curlish-it-{}", addr.port()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("uploaded.txt");
    std::fs::write(&path, "attachment body").unwrap();

    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();
    let file = FileRef::new(path.clone()).with_mime_type("text/plain");
    let echo = echo_of(&client.post(&[("title", "report")], &[file.into()], &[]).unwrap());

    assert!(echo
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
    assert!(echo.body.contains("name=\"title\"\r\n\r\nreport"));
    assert!(echo.body.contains("name=\"files[0]\"; filename=\"uploaded.txt\""));
    assert!(echo.body.contains("attachment body"));
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn multipart_names_cannot_inject_part_headers() {
    let addr = start_server();
    let dir = std::env::temp_dir().join(format!("curlish-it-{}", addr.port()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("x.txt");
    std::fs::write(&path, "payload").unwrap();

    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();
    let file = FileRef::new(path.clone()).with_upload_name("evil\"\r\nX-Injected: 1\r\n\r\nx.txt");
    let echo = echo_of(&client.post(&[("na\"me", "v")], &[file.into()], &[]).unwrap());

    assert!(echo.body.contains("name=\"na%22me\""));
    assert!(echo.body.contains("filename=\"evil%22%0D%0AX-Injected: 1%0D%0A%0D%0Ax.txt\""));
    assert!(!echo.body.contains("\r\nX-Injected"));
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn error_status_is_not_a_transport_error() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/status/404")).unwrap();

    let resp = client.get(&[]).unwrap();

    assert_eq!(resp.status(), 404);
    assert_eq!(resp.error_code(), 0);
    assert!(resp.is_completed());
    assert!(!resp.is_success());
    assert_eq!(resp.text(), "status 404");
}

#[test]
fn timeout_is_reported_in_band() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/slow/3000")).unwrap();
    client.set_timeout(1).unwrap();

    let resp = client.get(&[]).unwrap();

    assert_ne!(resp.error_code(), 0);
    assert!(!resp.error_message().is_empty());
    assert_eq!(resp.status(), 0);
    assert!(resp.body().is_none());
}

#[test]
fn unreachable_host_is_reported_in_band() {
    // Grab a free port, then close it so nothing is listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();

    let resp = client.get(&[]).unwrap();

    assert_ne!(resp.error_code(), 0);
    assert!(resp.body().is_none());
    assert!(!resp.is_completed());
}

#[test]
fn invalid_urls_fail_at_construction() {
    for url in ["", "no scheme here", "ftp://example.com/file"] {
        let err = Client::open(url).unwrap_err();
        assert!(matches!(err, RequestError::TransportInit(_)), "{url:?}: {err}");
    }
}

#[test]
fn closed_client_cannot_send() {
    let addr = start_server();
    let mut client = Client::open(&format!("http://{addr}/echo")).unwrap();
    client.close();
    client.close();

    assert!(matches!(client.get(&[]), Err(RequestError::NotInitialized)));
    assert!(matches!(
        client.json(&serde_json::json!({}), Method::Post),
        Err(RequestError::NotInitialized)
    ));
}
