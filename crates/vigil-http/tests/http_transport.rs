//! Integration tests against a canned HTTP/1.1 server on a local port.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use vigil_http::{ApiClient, ApiError, ClientConfig, ForcedLogoutTrigger, HttpAuthTransport};
use vigil_nav::{HistoryRouter, Location, NavigationConfig, NavigationGuard, Navigator, RouteTable};
use vigil_protocol::{Credential, LoginGrant, Registration, Token, UserId};
use vigil_session::{AuthFailure, AuthFailureKind, AuthTransport, SessionConfig, SessionManager};
use vigil_storage::MemoryStore;

// =========================================================================
// Canned server
// =========================================================================

/// Serves `status` + `body` to every connection and forwards each raw
/// request (headers and body) on the returned channel.
async fn serve(status: &'static str, body: &'static str) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let request = read_request(&mut stream).await;
            let _ = tx.send(request);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}/api/v1.0"), rx)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn transport(base_url: String) -> HttpAuthTransport {
    HttpAuthTransport::new(ClientConfig {
        base_url,
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
    .unwrap()
}

// =========================================================================
// HttpAuthTransport
// =========================================================================

#[tokio::test]
async fn test_login_success_parses_grant_and_posts_credential() {
    let (base, mut requests) =
        serve("200 OK", r#"{"access_token":"tok-1","user_id":42}"#).await;

    let grant = transport(base)
        .login(&Credential::new("alice", "pw"))
        .await
        .unwrap();

    assert_eq!(grant.access_token.as_str(), "tok-1");
    assert_eq!(grant.user_id, UserId::from("42"));

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /api/v1.0/login "));
    assert!(request.contains(r#""username":"alice""#));
}

#[tokio::test]
async fn test_login_unauthorized_uses_server_error_message() {
    let (base, _requests) = serve("401 Unauthorized", r#"{"error":"wrong password"}"#).await;

    let failure = transport(base)
        .login(&Credential::new("alice", "bad"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::RejectedCredential);
    assert_eq!(failure.message(), "wrong password");
}

#[tokio::test]
async fn test_login_rejected_without_body_uses_fallback_message() {
    let (base, _requests) = serve("401 Unauthorized", "").await;

    let failure = transport(base)
        .login(&Credential::new("alice", "bad"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::RejectedCredential);
    assert_eq!(failure.message(), "login failed, please retry");
}

#[tokio::test]
async fn test_login_server_error_is_unknown() {
    let (base, _requests) = serve("500 Internal Server Error", r#"{"message":"db down"}"#).await;

    let failure = transport(base)
        .login(&Credential::new("alice", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::Unknown);
    assert_eq!(failure.message(), "db down");
}

#[tokio::test]
async fn test_login_malformed_grant_is_unknown() {
    let (base, _requests) = serve("200 OK", r#"{"token":"wrong-field"}"#).await;

    let failure = transport(base)
        .login(&Credential::new("alice", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::Unknown);
}

#[tokio::test]
async fn test_login_unreachable_server_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let failure = transport(format!("http://{addr}"))
        .login(&Credential::new("alice", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::NetworkFailure);
}

#[tokio::test]
async fn test_login_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    let transport = HttpAuthTransport::new(ClientConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_millis(200),
        ..ClientConfig::default()
    })
    .unwrap();

    let failure = transport
        .login(&Credential::new("alice", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure, AuthFailure::timeout());
}

#[tokio::test]
async fn test_register_created_succeeds() {
    let (base, mut requests) = serve("201 Created", "{}").await;

    transport(base)
        .register(&Registration::new("bob", "pw").with_email("bob@example.com"))
        .await
        .unwrap();

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /api/v1.0/signin "));
    assert!(request.contains(r#""email":"bob@example.com""#));
}

#[tokio::test]
async fn test_register_conflict_uses_server_error() {
    let (base, _requests) = serve("409 Conflict", r#"{"error":"user exists"}"#).await;

    let failure = transport(base)
        .register(&Registration::new("bob", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::RejectedCredential);
    assert_eq!(failure.message(), "user exists");
}

#[tokio::test]
async fn test_register_other_success_status_is_failure() {
    let (base, _requests) = serve("202 Accepted", "{}").await;

    let failure = transport(base)
        .register(&Registration::new("bob", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::Unknown);
    assert!(failure.message().starts_with("registration failed"));
}

#[tokio::test]
async fn test_login_bare_not_found_is_unknown_not_rejected() {
    let (base, _requests) = serve("404 Not Found", "").await;

    let failure = transport(base)
        .login(&Credential::new("alice", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::Unknown);
    assert!(failure.message().contains("endpoint not found"));
}

#[tokio::test]
async fn test_login_not_found_with_reason_is_rejected() {
    let (base, _requests) = serve("404 Not Found", r#"{"error":"no such user"}"#).await;

    let failure = transport(base)
        .login(&Credential::new("nobody", "pw"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::RejectedCredential);
    assert_eq!(failure.message(), "no such user");
}

#[tokio::test]
async fn test_request_mail_code_posts_email() {
    let (base, mut requests) = serve("200 OK", r#"{"message":"sent"}"#).await;

    transport(base)
        .request_mail_code("bob@example.com")
        .await
        .unwrap();

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /api/v1.0/mailcode "));
    assert!(request.contains(r#"{"email":"bob@example.com"}"#));
}

#[tokio::test]
async fn test_request_mail_code_refused_uses_server_error() {
    let (base, _requests) = serve("400 Bad Request", r#"{"error":"invalid email"}"#).await;

    let failure = transport(base)
        .request_mail_code("not-an-address")
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::RejectedCredential);
    assert_eq!(failure.message(), "invalid email");
}

#[tokio::test]
async fn test_request_mail_code_server_error_uses_fallback() {
    let (base, _requests) = serve("503 Service Unavailable", "").await;

    let failure = transport(base)
        .request_mail_code("bob@example.com")
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), AuthFailureKind::Unknown);
    assert_eq!(failure.message(), "could not send verification code");
}

// =========================================================================
// ApiClient + ForcedLogoutTrigger
// =========================================================================

struct Grants;

impl AuthTransport for Grants {
    async fn login(&self, credential: &Credential) -> Result<LoginGrant, AuthFailure> {
        Ok(LoginGrant {
            access_token: Token::new(format!("tok-{}", credential.username)),
            user_id: UserId::from("7"),
        })
    }

    async fn register(&self, _registration: &Registration) -> Result<(), AuthFailure> {
        Ok(())
    }
}

struct Fixture {
    session: Arc<SessionManager<Grants>>,
    router: Arc<HistoryRouter>,
    client: ApiClient<Grants>,
}

async fn logged_in_fixture(base_url: String) -> Fixture {
    let session = Arc::new(SessionManager::new(
        Grants,
        MemoryStore::durable(),
        MemoryStore::session(),
        SessionConfig::default(),
    ));
    session.initialize();

    let nav = NavigationConfig::default();
    let guard = NavigationGuard::new(
        Arc::clone(&session) as Arc<dyn vigil_nav::AuthStatus>,
        RouteTable::dashboard(),
        nav.clone(),
    );
    let router = Arc::new(HistoryRouter::new(Arc::new(guard)));

    session.login(&Credential::new("alice", "pw")).await.unwrap();
    router.push(Location::new("/monitor")).unwrap();

    let trigger = ForcedLogoutTrigger::new(
        Arc::clone(&session),
        Arc::clone(&router) as Arc<dyn Navigator>,
        nav,
    );
    let client = ApiClient::new(
        ClientConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        },
        Arc::clone(&session),
        trigger,
    )
    .unwrap();

    Fixture {
        session,
        router,
        client,
    }
}

#[tokio::test]
async fn test_api_client_attaches_bearer_token() {
    let (base, mut requests) = serve("200 OK", r#"{"alerts":[]}"#).await;
    let fx = logged_in_fixture(base).await;

    let body: serde_json::Value = fx.client.get_json("/alerts").await.unwrap();

    assert_eq!(body["alerts"], serde_json::json!([]));
    let request = requests.recv().await.unwrap().to_lowercase();
    assert!(request.contains("authorization: bearer tok-alice"));
}

#[tokio::test]
async fn test_api_client_unauthorized_forces_logout_and_navigates_to_login() {
    let (base, _requests) = serve("401 Unauthorized", r#"{"error":"token expired"}"#).await;
    let fx = logged_in_fixture(base).await;

    let result: Result<serde_json::Value, ApiError> = fx.client.get_json("/devices").await;

    assert!(matches!(result, Err(ApiError::AuthExpired)));
    assert!(!fx.session.is_authenticated());
    assert_eq!(fx.session.token(), None);
    let here = fx.router.current();
    assert_eq!(here.path(), "/login");
    assert_eq!(here.query("redirect"), Some("/monitor"));
}

#[tokio::test]
async fn test_api_client_repeated_unauthorized_does_not_nest_redirect() {
    let (base, _requests) = serve("401 Unauthorized", "").await;
    let fx = logged_in_fixture(base).await;

    let _: Result<serde_json::Value, _> = fx.client.get_json("/a").await;
    let _: Result<serde_json::Value, _> = fx.client.get_json("/b").await;

    assert_eq!(fx.router.current().query("redirect"), Some("/monitor"));
}

#[tokio::test]
async fn test_api_client_other_status_keeps_session() {
    let (base, _requests) = serve("404 Not Found", r#"{"error":"no such device"}"#).await;
    let fx = logged_in_fixture(base).await;

    let result: Result<serde_json::Value, ApiError> = fx.client.get_json("/device/9").await;

    let Err(ApiError::Status { status, message }) = result else {
        panic!("expected status error");
    };
    assert_eq!(status.as_u16(), 404);
    assert_eq!(message, "no such device");
    assert!(fx.session.is_authenticated());
}

#[tokio::test]
async fn test_api_client_logged_out_sends_no_authorization() {
    let (base, mut requests) = serve("200 OK", "{}").await;
    let fx = logged_in_fixture(base).await;
    fx.session.logout();

    let _: serde_json::Value = fx.client.get_json("/public").await.unwrap();

    let request = requests.recv().await.unwrap().to_lowercase();
    assert!(!request.contains("authorization:"));
}

#[tokio::test]
async fn test_api_client_stale_unauthorized_keeps_newer_session() {
    let (base, _requests) = serve("401 Unauthorized", "").await;
    let fx = logged_in_fixture(base).await;
    let in_flight = fx.client.request(Method::GET, "/alerts");
    assert_eq!(in_flight.token().map(Token::as_str), Some("tok-alice"));

    fx.session.logout();
    fx.session.login(&Credential::new("bob", "pw")).await.unwrap();
    let result = fx.client.send(in_flight).await;

    assert!(matches!(result, Err(ApiError::AuthExpired)));
    assert!(fx.session.is_authenticated());
    assert_eq!(fx.session.token(), Some(Token::new("tok-bob")));
    assert_eq!(fx.router.current(), Location::new("/monitor"));
}

#[tokio::test]
async fn test_api_client_unauthorized_without_token_does_not_navigate() {
    let (base, _requests) = serve("401 Unauthorized", "").await;
    let fx = logged_in_fixture(base).await;
    fx.session.logout();

    let result: Result<serde_json::Value, ApiError> = fx.client.get_json("/alerts").await;

    assert!(matches!(result, Err(ApiError::AuthExpired)));
    assert_eq!(fx.router.current(), Location::new("/monitor"));
}
