//! Unit tests for the HTTP repository backend.
//!
//! Requests go to an in-memory repository served on a loopback port, so
//! status handling, upload order, rollback, and headers are checked on the
//! wire.

use super::*;
use rstest::{fixture, rstest};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

const VERSION_DIR: &str = "org/spatialite/spatialite/2.0.10";

/// A request line and the headers the tests look at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Recorded {
    method: String,
    path: String,
    authorization: Option<String>,
}

#[derive(Default)]
struct ServerState {
    files: BTreeMap<String, Vec<u8>>,
    requests: Vec<Recorded>,
}

/// Overrides the status for a method and request path.
type Rule = dyn Fn(&str, &str) -> Option<u16> + Send;

/// In-memory Maven repository behind a loopback listener.
struct TestServer {
    base_url: String,
    state: Arc<Mutex<ServerState>>,
}

impl TestServer {
    fn start(rule: impl Fn(&str, &str) -> Option<u16> + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local address");
        let state = Arc::new(Mutex::new(ServerState::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &shared, &rule);
            }
        });
        Self {
            base_url: format!("http://{addr}/releases"),
            state,
        }
    }

    fn repository(&self, credentials: Option<Credentials>) -> HttpRepository {
        let config = ureq::Agent::config_builder().proxy(None).build();
        HttpRepository::with_agent(
            &self.base_url,
            credentials,
            ureq::Agent::new_with_config(config),
        )
    }

    fn insert(&self, path: &str, contents: &[u8]) {
        self.state
            .lock()
            .expect("server state")
            .files
            .insert(format!("/releases/{path}"), contents.to_vec());
    }

    fn stored(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("server state")
            .files
            .keys()
            .map(|path| path.trim_start_matches("/releases/").to_owned())
            .collect()
    }

    fn requests(&self, method: &str) -> Vec<Recorded> {
        self.state
            .lock()
            .expect("server state")
            .requests
            .iter()
            .filter(|request| request.method == method)
            .cloned()
            .collect()
    }
}

fn serve(stream: TcpStream, state: &Mutex<ServerState>, rule: &Rule) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let mut length = 0;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).expect("header line") == 0 {
            break;
        }
        let Some((name, value)) = line.trim_end().split_once(':') else {
            break;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            length = value.parse().expect("numeric content-length");
        } else if name.eq_ignore_ascii_case("authorization") {
            authorization = Some(value.to_owned());
        }
    }
    let mut body = vec![0; length];
    reader.read_exact(&mut body).expect("request body");

    let (status, reply) = {
        let mut state = state.lock().expect("server state");
        state.requests.push(Recorded {
            method: method.clone(),
            path: path.clone(),
            authorization,
        });
        match rule(&method, &path) {
            Some(status) => (status, Vec::new()),
            None => match method.as_str() {
                "PUT" => {
                    state.files.insert(path, body);
                    (201, Vec::new())
                }
                "GET" => state
                    .files
                    .get(&path)
                    .map_or((404, Vec::new()), |contents| (200, contents.clone())),
                "HEAD" if state.files.contains_key(&path) => (200, Vec::new()),
                "DELETE" if state.files.remove(&path).is_some() => (200, Vec::new()),
                "HEAD" | "DELETE" => (404, Vec::new()),
                _ => (405, Vec::new()),
            },
        }
    };

    let mut stream = stream;
    let head = format!(
        "HTTP/1.1 {status} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.len()
    );
    stream.write_all(head.as_bytes()).expect("write status");
    if method != "HEAD" {
        stream.write_all(&reply).expect("write body");
    }
}

fn coordinate() -> Coordinate {
    Coordinate::new("org.spatialite", "spatialite", "2.0.10").expect("valid coordinate")
}

/// Files in the order the publisher hands them over.
#[fixture]
fn files() -> Vec<PublishedFile> {
    [
        "spatialite-2.0.10.aar.sha256",
        "spatialite-2.0.10.aar.sha512",
        "spatialite-2.0.10.aar",
        "spatialite-2.0.10.pom.sha256",
        "spatialite-2.0.10.pom.sha512",
        "spatialite-2.0.10.pom",
    ]
    .into_iter()
    .map(|name| PublishedFile {
        name: name.to_owned(),
        contents: name.as_bytes().to_vec(),
    })
    .collect()
}

#[test]
fn head_404_means_absent() {
    let server = TestServer::start(|_, _| None);
    server.insert("org/spatialite/spatialite/maven-metadata.xml", b"<metadata/>");
    let repo = server.repository(None);

    assert!(
        repo.exists("org/spatialite/spatialite/maven-metadata.xml")
            .expect("HEAD succeeds")
    );
    assert!(!repo.exists(&format!("{VERSION_DIR}/spatialite-2.0.10.pom")).expect("HEAD succeeds"));
}

#[test]
fn read_returns_none_for_missing_file() {
    let server = TestServer::start(|_, _| None);
    server.insert("org/spatialite/spatialite/maven-metadata.xml", b"<metadata/>");
    let repo = server.repository(None);

    assert_eq!(
        repo.read("org/spatialite/spatialite/maven-metadata.xml")
            .expect("GET succeeds"),
        Some(b"<metadata/>".to_vec())
    );
    assert_eq!(repo.read("org/spatialite/other/maven-metadata.xml").expect("GET succeeds"), None);
}

#[rstest]
fn conflict_maps_to_duplicate_coordinate(files: Vec<PublishedFile>) {
    let server = TestServer::start(|method, _| (method == "PUT").then_some(409));
    let repo = server.repository(None);

    let err = repo
        .publish_version(&coordinate(), &files)
        .expect_err("server refuses the upload");

    assert!(matches!(err, PublishError::DuplicateCoordinate { .. }), "{err:?}");
    assert!(server.requests("DELETE").is_empty());
}

#[rstest]
fn credentials_are_sent_on_every_request(files: Vec<PublishedFile>) {
    let server = TestServer::start(|_, _| None);
    let repo = server.repository(Some(Credentials::new("deployer", "s3cret")));

    repo.exists(&format!("{VERSION_DIR}/spatialite-2.0.10.pom")).expect("HEAD succeeds");
    repo.publish_version(&coordinate(), &files).expect("upload succeeds");
    repo.read(&format!("{VERSION_DIR}/spatialite-2.0.10.aar")).expect("GET succeeds");

    let requests = server.state.lock().expect("server state").requests.clone();
    assert_eq!(requests.len(), 8);
    for request in requests {
        assert_eq!(
            request.authorization.as_deref(),
            Some("Basic ZGVwbG95ZXI6czNjcmV0"),
            "{} {}",
            request.method,
            request.path
        );
    }
}

#[test]
fn anonymous_requests_carry_no_authorization() {
    let server = TestServer::start(|_, _| None);
    let repo = server.repository(None);

    repo.write("org/spatialite/spatialite/maven-metadata.xml", b"<metadata/>")
        .expect("PUT succeeds");

    assert_eq!(server.requests("PUT")[0].authorization, None);
}

#[rstest]
fn pom_is_uploaded_last(mut files: Vec<PublishedFile>) {
    files.rotate_right(1);
    let server = TestServer::start(|_, _| None);
    let repo = server.repository(None);

    repo.publish_version(&coordinate(), &files).expect("upload succeeds");

    let puts = server.requests("PUT");
    assert_eq!(puts.len(), 6);
    assert!(
        puts.last()
            .is_some_and(|put| put.path.ends_with("/spatialite-2.0.10.pom")),
        "{puts:?}"
    );
    assert_eq!(server.stored().len(), 6);
}

#[rstest]
fn failed_upload_removes_files_already_sent(files: Vec<PublishedFile>) {
    let server = TestServer::start(|method, path| {
        (method == "PUT" && path.ends_with(".pom")).then_some(500)
    });
    let repo = server.repository(None);

    let err = repo
        .publish_version(&coordinate(), &files)
        .expect_err("POM upload fails");

    assert!(
        matches!(err, PublishError::Http { ref reason, .. } if reason.contains("500")),
        "{err:?}"
    );
    assert!(server.stored().is_empty(), "left behind: {:?}", server.stored());
    assert!(!repo.exists(&format!("{VERSION_DIR}/spatialite-2.0.10.aar")).expect("HEAD succeeds"));

    let mut sent: Vec<String> = server
        .requests("PUT")
        .into_iter()
        .filter(|put| !put.path.ends_with(".pom"))
        .map(|put| put.path)
        .collect();
    sent.reverse();
    let deleted: Vec<String> = server
        .requests("DELETE")
        .into_iter()
        .map(|delete| delete.path)
        .collect();
    assert_eq!(deleted, sent);
}

#[rstest]
fn files_that_cannot_be_removed_are_named(files: Vec<PublishedFile>) {
    let server = TestServer::start(|method, path| match method {
        "PUT" if path.ends_with(".pom") => Some(500),
        "DELETE" if path.ends_with(".aar") => Some(403),
        _ => None,
    });
    let repo = server.repository(None);

    let err = repo
        .publish_version(&coordinate(), &files)
        .expect_err("POM upload fails");

    let aar = format!("{VERSION_DIR}/spatialite-2.0.10.aar");
    match &err {
        PublishError::IncompleteRollback { cause, left } => {
            assert!(matches!(**cause, PublishError::Http { .. }), "{cause:?}");
            assert_eq!(left, &vec![aar.clone()]);
        }
        other => panic!("expected IncompleteRollback, got {other:?}"),
    }
    assert!(err.to_string().contains(&aar));
    assert_eq!(server.stored(), vec![aar]);
}

#[test]
fn basic_auth_header_is_base64_encoded() {
    let credentials = Credentials::new("deployer", "s3cret");
    assert_eq!(credentials.header_value(), "Basic ZGVwbG95ZXI6czNjcmV0");
}

#[test]
fn debug_output_redacts_password() {
    let rendered = format!("{:?}", Credentials::new("deployer", "s3cret"));
    assert!(rendered.contains("deployer"));
    assert!(!rendered.contains("s3cret"));
}

#[test]
fn credentials_require_both_variables() {
    temp_env::with_vars(
        [(USERNAME_ENV, Some("deployer")), (PASSWORD_ENV, None::<&str>)],
        || assert_eq!(Credentials::from_env(), None),
    );
    temp_env::with_vars(
        [(USERNAME_ENV, Some("deployer")), (PASSWORD_ENV, Some("s3cret"))],
        || {
            assert_eq!(
                Credentials::from_env(),
                Some(Credentials::new("deployer", "s3cret"))
            );
        },
    );
}

#[test]
fn url_joins_without_double_slashes() {
    let repo = HttpRepository::new("https://maven.example.org/releases///", None);
    assert_eq!(
        repo.url_for("/org/spatialite/spatialite/2.0.10/spatialite-2.0.10.aar"),
        "https://maven.example.org/releases/org/spatialite/spatialite/2.0.10/spatialite-2.0.10.aar"
    );
}

#[test]
fn unauthorised_errors_mention_credentials() {
    let err = map_ureq_error("https://maven.example.org", &ureq::Error::StatusCode(401));
    assert!(err.to_string().contains(USERNAME_ENV));
}
