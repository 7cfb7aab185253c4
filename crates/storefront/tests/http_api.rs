use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use storefront::api::{ApiFailure, HttpApi, MarketplaceApi, SearchQuery};
use storefront::images::ImageTarget;

/// Serve one canned HTTP response on a loopback port. The request line,
/// headers and body come back through the receiver.
fn serve_once(status: &str, headers: &[(&str, &str)], body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let mut response = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n", body.len());
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(body);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let end = line == "\r\n";
            request.push_str(&line);
            if end {
                break;
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("request body");
        request.push_str(&String::from_utf8_lossy(&body));
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().ok();
        tx.send(request).ok();
    });
    (format!("http://{addr}"), rx)
}

fn api(base: &str, token: Option<&str>) -> HttpApi {
    HttpApi::new(base, Duration::from_secs(5), token.map(str::to_string)).expect("client")
}

fn received(rx: &mpsc::Receiver<String>) -> String {
    rx.recv_timeout(Duration::from_secs(5)).expect("request seen")
}

#[test]
fn json_reply_with_paging_headers() {
    let body = r#"[{"id": 3, "firstName": "Tom", "lastName": "Rizzi", "role": "USER"}]"#;
    let (base, rx) = serve_once(
        "200 OK",
        &[("Content-Type", "application/json"), ("Total-Rows", "11"), ("Total-Pages", "3")],
        body,
    );
    let query = SearchQuery::users("Tom Rizzi").with_page(2);
    let reply = api(&base, Some("t0k3n")).search_users(&query).expect("search succeeds");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.total_rows, Some(11));
    assert_eq!(reply.total_pages, Some(3));
    assert_eq!(reply.data.len(), 1);
    assert_eq!(reply.data[0].full_name(), "Tom Rizzi");

    let request = received(&rx);
    assert!(request.starts_with(
        "GET /users/search?searchQuery=Tom%20Rizzi&orderBy=fullNameASC&page=1&pageSize=5 HTTP/1.1"
    ));
    assert!(request.to_lowercase().contains("cookie: jsessionid=t0k3n"));
}

#[test]
fn error_status_carries_server_message() {
    let (base, rx) = serve_once(
        "403 Forbidden",
        &[("Content-Type", "application/json")],
        r#"{"message": "Not an administrator of this business"}"#,
    );
    let err = api(&base, None).delete_listing(1, 7).unwrap_err();
    assert_eq!(
        err,
        ApiFailure::with_message(403, "Not an administrator of this business")
    );
    let request = received(&rx);
    assert!(request.starts_with("DELETE /businesses/1/listings/7 HTTP/1.1"));
    assert!(!request.to_lowercase().contains("cookie:"));
}

#[test]
fn error_status_without_json_body() {
    let (base, _rx) = serve_once("406 Not Acceptable", &[], "gone");
    let err = api(&base, None).get_listing(1, 7).unwrap_err();
    assert_eq!(err, ApiFailure::status(406));
}

#[test]
fn undecodable_body_is_malformed() {
    let (base, _rx) = serve_once("200 OK", &[("Content-Type", "application/json")], "{not json");
    let err = api(&base, None).get_card(5).unwrap_err();
    assert!(matches!(err, ApiFailure::Malformed { .. }), "{err:?}");
}

#[test]
fn refused_connection_is_no_response() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        listener.local_addr().expect("local addr").port()
    };
    let err = api(&format!("http://127.0.0.1:{port}"), None)
        .toggle_bookmark(7)
        .unwrap_err();
    assert!(matches!(err, ApiFailure::NoResponse { .. }), "{err:?}");
    assert_eq!(err.status_code(), None);
}

#[test]
fn posts_send_json_bodies() {
    let (base, rx) = serve_once(
        "201 Created",
        &[("Content-Type", "application/json")],
        r#"{"keywordId": 12}"#,
    );
    let reply = api(&base, None).create_keyword("Vintage").expect("created");
    assert_eq!(reply.status, 201);
    assert_eq!(reply.data.keyword_id, 12);
    let request = received(&rx);
    assert!(request.starts_with("POST /keywords HTTP/1.1"));
    assert!(request.ends_with(r#"{"name":"Vintage"}"#));
}

#[test]
fn primary_image_path_per_target() {
    let (base, rx) = serve_once("200 OK", &[], "");
    let target = ImageTarget::Product {
        business_id: 1,
        product_id: "WATT".into(),
    };
    api(&base, None).set_primary_image(&target, 4).expect("primary set");
    let request = received(&rx);
    assert!(request.starts_with("PUT /businesses/1/products/WATT/images/4/makeprimary HTTP/1.1"));
}
