use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use clubhouse_api::{AppStateInner, router};
use clubhouse_db::Database;

struct TestServer {
    base: String,
    student: i64,
    other_student: i64,
    club: i64,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }
}

async fn start_server() -> TestServer {
    let db = Database::open_in_memory().expect("open db");
    let student = db.insert_student("Sam", "Rivera", "sam@university.edu").expect("student");
    let other_student = db.insert_student("Lee", "Chen", "lee@university.edu").expect("student");
    let club = db
        .insert_club("Coding Club", "Learn programming and build amazing projects together.", "Technology")
        .expect("club");

    let app = router(AppStateInner::new(db));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });

    TestServer {
        base: format!("http://{}", addr),
        student,
        other_student,
        club,
        _shutdown: shutdown_tx,
    }
}

async fn send(
    client: &reqwest::Client,
    srv: &TestServer,
    from: (&str, i64),
    to: (&str, i64),
    text: &str,
) -> reqwest::Response {
    client
        .post(srv.url("/messages"))
        .json(&json!({
            "senderID": from.1,
            "senderType": from.0,
            "receiverID": to.1,
            "receiverType": to.0,
            "messageText": text,
        }))
        .send()
        .await
        .expect("send message")
}

#[tokio::test]
async fn join_bookmark_and_message_end_to_end() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    // Join
    let res = client
        .post(srv.url(&format!("/clubs/{}/members", srv.club)))
        .json(&json!({ "studentID": srv.student }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let membership: Value = res.json().await.unwrap();
    assert_eq!(membership["studentID"], srv.student);
    assert_eq!(membership["studentName"], "Sam Rivera");

    // Bookmark
    let res = client
        .post(srv.url(&format!("/students/{}/bookmarks", srv.student)))
        .json(&json!({ "clubID": srv.club }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let bookmark: Value = res.json().await.unwrap();
    assert_eq!(bookmark["clubName"], "Coding Club");

    // Club says welcome
    let res = send(&client, &srv, ("club", srv.club), ("student", srv.student), "Welcome!").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let welcome: Value = res.json().await.unwrap();
    assert_eq!(welcome["messageID"], 1);
    assert_eq!(welcome["senderName"], "Coding Club");

    // Student sees one unread conversation
    let convs: Value = client
        .get(srv.url(&format!("/conversations/student/{}", srv.student)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let convs = convs.as_array().unwrap();
    assert_eq!(convs.len(), 1);
    assert_eq!(convs[0]["otherUserID"], srv.club);
    assert_eq!(convs[0]["otherUserType"], "club");
    assert_eq!(convs[0]["lastMessage"], "Welcome!");
    assert_eq!(convs[0]["unreadCount"], 1);

    // Student replies
    let res = send(&client, &srv, ("student", srv.student), ("club", srv.club), "Thanks!").await;
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply["messageID"], 2);

    // Club fetches the thread
    let thread: Value = client
        .get(srv.url(&format!(
            "/messages/club/{}?otherID={}&otherType=student",
            srv.club, srv.student
        )))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let texts: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["messageText"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["Welcome!", "Thanks!"]);
}

#[tokio::test]
async fn repeated_join_and_bookmark_are_idempotent() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    let first: Value = client
        .post(srv.url(&format!("/clubs/{}/members", srv.club)))
        .json(&json!({ "studentID": srv.student }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .post(srv.url(&format!("/clubs/{}/members", srv.club)))
        .json(&json!({ "studentID": srv.student }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let second: Value = res.json().await.unwrap();
    assert_eq!(first["membershipID"], second["membershipID"]);

    let members: Value = client
        .get(srv.url(&format!("/clubs/{}/members", srv.club)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members.as_array().unwrap().len(), 1);

    for expected in [StatusCode::CREATED, StatusCode::OK] {
        let res = client
            .post(srv.url(&format!("/students/{}/bookmarks", srv.student)))
            .json(&json!({ "clubID": srv.club }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected);
    }

    let status: Value = client
        .get(srv.url(&format!("/students/{}/clubs/{}", srv.student, srv.club)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status, json!({ "isMember": true, "isBookmarked": true }));
}

#[tokio::test]
async fn removals_are_benign_by_pair_and_strict_by_id() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    let bookmark: Value = client
        .post(srv.url(&format!("/students/{}/bookmarks", srv.student)))
        .json(&json!({ "clubID": srv.club }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let pair_url = srv.url(&format!("/students/{}/bookmarks/{}", srv.student, srv.club));
    let first: Value = client.delete(&pair_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(first, json!({ "removed": true }));
    let again = client.delete(&pair_url).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(again.json::<Value>().await.unwrap(), json!({ "removed": false }));

    let by_id = client
        .delete(srv.url(&format!("/bookmarks/{}", bookmark["bookmarkID"])))
        .send()
        .await
        .unwrap();
    assert_eq!(by_id.status(), StatusCode::NOT_FOUND);

    let membership: Value = client
        .post(srv.url(&format!("/clubs/{}/members", srv.club)))
        .json(&json!({ "studentID": srv.student }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let leave_url = srv.url(&format!("/members/{}", membership["membershipID"]));
    assert_eq!(client.delete(&leave_url).send().await.unwrap().status(), StatusCode::OK);
    assert_eq!(client.delete(&leave_url).send().await.unwrap().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_messages_are_rejected_without_side_effects() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    let empty = send(&client, &srv, ("student", srv.student), ("club", srv.club), "   ").await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body: Value = empty.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("empty"));

    let to_self = send(&client, &srv, ("student", srv.student), ("student", srv.student), "hi me").await;
    assert_eq!(to_self.status(), StatusCode::BAD_REQUEST);

    let nowhere = send(&client, &srv, ("student", srv.student), ("club", 9999), "hello?").await;
    assert_eq!(nowhere.status(), StatusCode::NOT_FOUND);

    let bad_kind = send(&client, &srv, ("faculty", 1), ("club", srv.club), "hello").await;
    assert_eq!(bad_kind.status(), StatusCode::BAD_REQUEST);

    let stats: Value = client.get(srv.url("/stats")).send().await.unwrap().json().await.unwrap();
    assert_eq!(stats["totalMessages"], 0);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    let missing_text = client
        .post(srv.url("/messages"))
        .json(&json!({
            "senderID": srv.student,
            "senderType": "student",
            "receiverID": srv.club,
            "receiverType": "club",
        }))
        .send()
        .await
        .unwrap();
    let string_id = client
        .post(srv.url("/messages"))
        .json(&json!({
            "senderID": "sam",
            "senderType": "student",
            "receiverID": srv.club,
            "receiverType": "club",
            "messageText": "hi",
        }))
        .send()
        .await
        .unwrap();
    let bad_club_id = client.get(srv.url("/clubs/abc/members")).send().await.unwrap();
    let no_counterpart = client
        .get(srv.url(&format!("/messages/student/{}", srv.student)))
        .send()
        .await
        .unwrap();
    let bad_join_body = client
        .post(srv.url(&format!("/clubs/{}/members", srv.club)))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    for (label, res) in [
        ("missing messageText", missing_text),
        ("string senderID", string_id),
        ("non-integer club id", bad_club_id),
        ("thread without otherID", no_counterpart),
        ("unparseable join body", bad_join_body),
    ] {
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", label);
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string(), "{}: {}", label, body);
    }

    let stats: Value = client.get(srv.url("/stats")).send().await.unwrap().json().await.unwrap();
    assert_eq!(stats["totalMessages"], 0);
    assert_eq!(stats["totalMemberships"], 0);
}

#[tokio::test]
async fn mark_read_clears_unread_count() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    for text in ["one", "two", "three"] {
        send(&client, &srv, ("club", srv.club), ("student", srv.student), text).await;
    }

    let conv_url = srv.url(&format!("/conversations/student/{}", srv.student));
    let convs: Value = client.get(&conv_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(convs[0]["unreadCount"], 3);

    let read_url = srv.url(&format!(
        "/messages/student/{}/read?otherID={}&otherType=club",
        srv.student, srv.club
    ));
    let marked: Value = client.put(&read_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(marked, json!({ "marked": 3 }));
    let marked: Value = client.put(&read_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(marked, json!({ "marked": 0 }));

    let convs: Value = client.get(&conv_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(convs[0]["unreadCount"], 0);
}

#[tokio::test]
async fn single_message_receipt_is_receiver_only() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    let msg: Value = send(&client, &srv, ("student", srv.other_student), ("student", srv.student), "notes?")
        .await
        .json()
        .await
        .unwrap();
    let id = &msg["messageID"];

    let wrong_viewer = client
        .put(srv.url(&format!("/messages/student/{}/read/{}", srv.other_student, id)))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_viewer.status(), StatusCode::NOT_FOUND);

    let url = srv.url(&format!("/messages/student/{}/read/{}", srv.student, id));
    let first: Value = client.put(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(first, json!({ "updated": true }));
    let second: Value = client.put(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(second, json!({ "updated": false }));
}

#[tokio::test]
async fn unknown_principals_are_not_found() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    for path in [
        "/students/404/bookmarks".to_string(),
        "/clubs/404/members".to_string(),
        "/conversations/club/404".to_string(),
        format!("/messages/student/{}?otherID=404&otherType=club", srv.student),
        format!("/students/404/clubs/{}", srv.club),
    ] {
        let res = client.get(srv.url(&path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "GET {}", path);
    }

    let res = client
        .post(srv.url("/clubs/404/members"))
        .json(&json!({ "studentID": srv.student }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(srv.url("/conversations/faculty/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = start_server().await;
    let body: Value = reqwest::get(srv.url("/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
