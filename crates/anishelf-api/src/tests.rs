//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use anishelf_core::{
  anime::{AnimeId, NewAnime},
  comment::{CommentId, NewComment},
  related::{PREQUEL, SEQUEL},
  store::CatalogStore,
  user::{NewUser, Role, User},
};
use anishelf_store_sqlite::SqliteStore;
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{api_router, viewer::USER_HEADER};

struct TestApp {
  router: Router,
  store:  Arc<SqliteStore>,
}

struct Reply {
  status:   StatusCode,
  location: Option<String>,
  body:     Value,
}

impl TestApp {
  async fn new() -> Self {
    let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
    Self { router: api_router(store.clone()), store }
  }

  async fn user(&self, name: &str, role: Role) -> User {
    self.store.add_user(NewUser::new(name, role)).await.unwrap()
  }

  async fn anime(&self, title: &str) -> AnimeId {
    self
      .store
      .create_anime(NewAnime {
        title:           title.into(),
        alt_title:       None,
        kind:            "TV".into(),
        genres:          vec!["Драма".into()],
        episodes:        Some(24),
        status:          "Вышел".into(),
        source:          None,
        season_date:     NaiveDate::from_ymd_opt(2009, 4, 3).unwrap(),
        description:     None,
        trailer_url:     None,
        cover_path:      None,
        studios:         vec![],
        mpaa_rating:     None,
        age_rating:      None,
        duration:        None,
        main_characters: vec![],
        related_items:   vec![],
      })
      .await
      .unwrap()
      .anime_id
  }

  async fn comment(&self, anime_id: AnimeId, author: &User, parent: Option<CommentId>) -> CommentId {
    self
      .store
      .add_comment(NewComment {
        anime_id,
        user_id: author.user_id,
        parent_id: parent,
        body: "hello".into(),
      })
      .await
      .unwrap()
      .comment_id
  }

  async fn call(
    &self,
    method: &str,
    uri: &str,
    viewer: Option<&User>,
    body: Option<Value>,
    referer: Option<&str>,
  ) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(v) = viewer {
      builder = builder.header(USER_HEADER, v.user_id.to_string());
    }
    if let Some(r) = referer {
      builder = builder.header(header::REFERER, r);
    }
    let req = match body {
      Some(b) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = self.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let location = resp
      .headers()
      .get(header::LOCATION)
      .map(|v| v.to_str().unwrap().to_owned());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, location, body }
  }

  async fn get(&self, uri: &str, viewer: Option<&User>) -> Reply {
    self.call("GET", uri, viewer, None, None).await
  }
}

fn anime_body(title: &str, related: Value) -> Value {
  json!({
    "title": title,
    "type": "TV",
    "genres": ["Драма"],
    "status": "Вышел",
    "season_date": "2010-01-10",
    "related_items": related,
  })
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_lists_and_searches() {
  let app = TestApp::new().await;
  app.anime("Steins;Gate").await;
  app.anime("Steins;Gate 0").await;
  app.anime("Kanon").await;

  let resp = app.get("/anime?sort=title&dir=asc", None).await;
  assert_eq!(resp.status, StatusCode::OK);
  let titles: Vec<&str> =
    resp.body.as_array().unwrap().iter().map(|a| a["title"].as_str().unwrap()).collect();
  assert_eq!(titles, vec!["Kanon", "Steins;Gate", "Steins;Gate 0"]);
  assert_eq!(resp.body[0]["season"], "Весна 2009");

  let resp = app.get("/anime/search?q=steins", None).await;
  assert_eq!(resp.body.as_array().unwrap().len(), 2);

  let resp = app.get("/anime/search?q=%20%20", None).await;
  assert_eq!(resp.body, json!([]));
}

#[tokio::test]
async fn missing_anime_is_404() {
  let app = TestApp::new().await;
  let resp = app.get("/anime/42", None).await;
  assert_eq!(resp.status, StatusCode::NOT_FOUND);
  assert!(resp.body["error"].as_str().unwrap().contains("42"));
}

#[tokio::test]
async fn detail_carries_thread_and_viewer_data() {
  let app = TestApp::new().await;
  let id = app.anime("Clannad").await;
  let alice = app.user("alice", Role::User).await;
  let bob = app.user("bob", Role::User).await;
  let root = app.comment(id, &alice, None).await;
  let reply = app.comment(id, &bob, Some(root)).await;
  app.comment(id, &alice, Some(reply)).await;

  let resp = app.get(&format!("/anime/{id}"), Some(&bob)).await;
  assert_eq!(resp.status, StatusCode::OK);
  let thread = resp.body["comments"].as_array().unwrap();
  assert_eq!(thread.len(), 1);
  let replies = thread[0]["replies"].as_array().unwrap();
  assert_eq!(replies.len(), 2);
  assert_eq!(replies[0]["reply_to"], "alice");
  assert_eq!(replies[1]["reply_to"], "bob");
  assert_eq!(replies[0]["can_edit"], true);
  assert_eq!(thread[0]["can_delete"], false);
  assert_eq!(resp.body["viewer"]["username"], "bob");

  let anonymous = app.get(&format!("/anime/{id}"), None).await;
  assert_eq!(anonymous.body["viewer"], Value::Null);
  assert_eq!(anonymous.body["comments"][0]["can_edit"], false);
}

// ─── Admin anime ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_endpoints_require_staff() {
  let app = TestApp::new().await;
  let user = app.user("plain", Role::User).await;
  let body = anime_body("X", json!([]));

  let anon = app.call("POST", "/admin/anime", None, Some(body.clone()), None).await;
  assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
  let plain = app.call("POST", "/admin/anime", Some(&user), Some(body), None).await;
  assert_eq!(plain.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn saving_related_items_keeps_graph_symmetric() {
  let app = TestApp::new().await;
  let admin = app.user("admin", Role::Admin).await;
  let b = app.anime("First season").await;

  let resp = app
    .call(
      "POST",
      "/admin/anime",
      Some(&admin),
      Some(anime_body("Second season", json!([{ "anime_id": b, "type": SEQUEL }]))),
      None,
    )
    .await;
  assert_eq!(resp.status, StatusCode::CREATED);
  let a = resp.body["anime_id"].as_i64().unwrap();

  let detail = app.get(&format!("/anime/{b}"), None).await;
  assert_eq!(detail.body["related_items"], json!([{ "anime_id": a, "type": PREQUEL }]));
  assert_eq!(detail.body["related"][0]["title"], "Second season");
  assert_eq!(detail.body["related_anime_id"], a);

  let resp = app
    .call("PUT", &format!("/admin/anime/{a}"), Some(&admin), Some(anime_body("Second season", json!([]))), None)
    .await;
  assert_eq!(resp.status, StatusCode::OK);

  let detail = app.get(&format!("/anime/{b}"), None).await;
  assert_eq!(detail.body["related_items"], json!([]));
  assert_eq!(detail.body["related_anime_id"], Value::Null);
}

#[tokio::test]
async fn admin_responses_carry_derived_fields() {
  let app = TestApp::new().await;
  let admin = app.user("admin", Role::Admin).await;
  let b = app.anime("Air").await;

  let mut body = anime_body("Air in Summer", json!([{ "anime_id": b, "type": PREQUEL }]));
  body["studios"] = json!([12, 0, 12, 4]);
  body["mpaa_rating"] = json!("PG");
  body["duration"] = json!("24 мин.");
  body["main_characters"] = json!([
    { "id": 5, "name": " Kamio Misuzu ", "voice_actor": "Kawakami Tomoko" },
    { "name": "  " },
    { "name": "Kannabi no Mikoto" },
  ]);
  let resp = app.call("POST", "/admin/anime", Some(&admin), Some(body), None).await;
  assert_eq!(resp.status, StatusCode::CREATED);
  assert_eq!(resp.body["related_anime_id"], b);
  assert_eq!(resp.body["related_type"], PREQUEL);
  assert_eq!(resp.body["season"], "Зима 2010");
  assert_eq!(resp.body["studios"], json!([12, 4]));
  assert_eq!(resp.body["studio_id"], 12);
  assert_eq!(resp.body["main_character_id"], 5);
  assert_eq!(resp.body["main_voice_actor"], "Kawakami Tomoko | ");
  assert_eq!(resp.body["main_characters"][0]["name"], "Kamio Misuzu");
  assert_eq!(resp.body["main_characters"].as_array().unwrap().len(), 2);
  let a = resp.body["anime_id"].as_i64().unwrap();

  let detail = app.get(&format!("/anime/{a}"), None).await;
  assert_eq!(detail.body["studio_id"], 12);
  assert_eq!(detail.body["mpaa_rating"], "PG");
  assert_eq!(detail.body["duration"], "24 мин.");

  let mut body = anime_body("Air in Summer", json!([]));
  body["studio_id"] = json!(3);
  let resp = app.call("PUT", &format!("/admin/anime/{a}"), Some(&admin), Some(body), None).await;
  assert_eq!(resp.status, StatusCode::OK);
  assert_eq!(resp.body["related_anime_id"], Value::Null);
  assert_eq!(resp.body["studios"], json!([3]));
  assert_eq!(resp.body["main_voice_actor"], Value::Null);
}

#[tokio::test]
async fn legacy_related_pair_is_synced() {
  let app = TestApp::new().await;
  let admin = app.user("admin", Role::Admin).await;
  let b = app.anime("Original").await;

  let mut body = anime_body("Remake", json!([]));
  body["related_anime_id"] = json!(b);
  body["related_type"] = json!(PREQUEL);
  let resp = app.call("POST", "/admin/anime", Some(&admin), Some(body), None).await;
  assert_eq!(resp.status, StatusCode::CREATED);

  let detail = app.get(&format!("/anime/{b}"), None).await;
  assert_eq!(detail.body["related_items"][0]["type"], SEQUEL);
}

#[tokio::test]
async fn invalid_anime_payloads_are_422() {
  let app = TestApp::new().await;
  let admin = app.user("admin", Role::Moderator).await;

  let unknown = anime_body("X", json!([{ "anime_id": 999, "type": SEQUEL }]));
  let resp = app.call("POST", "/admin/anime", Some(&admin), Some(unknown), None).await;
  assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

  let mut six_studios = anime_body("X", json!([]));
  six_studios["studios"] = json!([1, 2, 3, 4, 5, 6]);
  let resp = app.call("POST", "/admin/anime", Some(&admin), Some(six_studios), None).await;
  assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

  let mut no_genres = anime_body("X", json!([]));
  no_genres["genres"] = json!([]);
  let resp = app.call("POST", "/admin/anime", Some(&admin), Some(no_genres), None).await;
  assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

  let resp = app
    .call("PUT", "/admin/anime/5000", Some(&admin), Some(anime_body("X", json!([]))), None)
    .await;
  assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_and_bulk_delete() {
  let app = TestApp::new().await;
  let admin = app.user("admin", Role::Admin).await;
  let a = app.anime("A").await;
  let b = app.anime("B").await;
  let c = app.anime("C").await;

  let resp = app.call("DELETE", &format!("/admin/anime/{a}"), Some(&admin), None, None).await;
  assert_eq!(resp.status, StatusCode::NO_CONTENT);
  let resp = app.call("DELETE", &format!("/admin/anime/{a}"), Some(&admin), None, None).await;
  assert_eq!(resp.status, StatusCode::NOT_FOUND);

  let resp = app
    .call("POST", "/admin/anime/bulk-delete", Some(&admin), Some(json!({ "ids": [b, c, a] })), None)
    .await;
  assert_eq!(resp.body["deleted"], 2);
  assert_eq!(app.get("/anime", None).await.body, json!([]));
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn posting_a_comment_redirects_back() {
  let app = TestApp::new().await;
  let id = app.anime("A").await;
  let alice = app.user("alice", Role::User).await;
  let uri = format!("/anime/{id}/comments");

  let resp = app
    .call("POST", &uri, Some(&alice), Some(json!({ "body": "great" })), Some("/anime/1?tab=c"))
    .await;
  assert_eq!(resp.status, StatusCode::SEE_OTHER);
  assert_eq!(resp.location.as_deref(), Some("/anime/1?tab=c"));

  let resp = app.call("POST", &uri, Some(&alice), Some(json!({ "body": "again" })), None).await;
  assert_eq!(resp.location, Some(format!("/anime/{id}")));

  let anon = app.call("POST", &uri, None, Some(json!({ "body": "x" })), None).await;
  assert_eq!(anon.status, StatusCode::UNAUTHORIZED);

  let blank = app.call("POST", &uri, Some(&alice), Some(json!({ "body": "   " })), None).await;
  assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);

  let long = "я".repeat(2001);
  let resp = app.call("POST", &uri, Some(&alice), Some(json!({ "body": long })), None).await;
  assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn replies_notify_the_parent_author() {
  let app = TestApp::new().await;
  let id = app.anime("A").await;
  let other = app.anime("B").await;
  let alice = app.user("alice", Role::User).await;
  let bob = app.user("bob", Role::User).await;
  let root = app.comment(id, &alice, None).await;

  let resp = app
    .call(
      "POST",
      &format!("/anime/{id}/comments"),
      Some(&bob),
      Some(json!({ "body": "reply  text", "parent_id": root })),
      None,
    )
    .await;
  assert_eq!(resp.status, StatusCode::SEE_OTHER);

  let inbox = app.get("/notifications", Some(&alice)).await;
  assert_eq!(inbox.body["unread_count"], 1);
  let item = &inbox.body["items"][0];
  assert_eq!(item["data"]["type"], "comment_reply");
  assert_eq!(item["data"]["parent_id"], root);
  assert_eq!(item["data"]["comment_body"], "reply text");

  // A parent on another anime is not found.
  let resp = app
    .call(
      "POST",
      &format!("/anime/{other}/comments"),
      Some(&bob),
      Some(json!({ "body": "x", "parent_id": root })),
      None,
    )
    .await;
  assert_eq!(resp.status, StatusCode::NOT_FOUND);

  // Replying to yourself records nothing.
  app
    .call(
      "POST",
      &format!("/anime/{id}/comments"),
      Some(&alice),
      Some(json!({ "body": "me too", "parent_id": root })),
      None,
    )
    .await;
  assert_eq!(app.get("/notifications", Some(&alice)).await.body["unread_count"], 1);
}

#[tokio::test]
async fn edit_and_delete_permissions() {
  let app = TestApp::new().await;
  let id = app.anime("A").await;
  let author = app.user("author", Role::User).await;
  let other = app.user("other", Role::User).await;
  let moderator = app.user("mod", Role::Moderator).await;
  let c = app.comment(id, &author, None).await;
  let reply = app.comment(id, &other, Some(c)).await;
  let uri = format!("/anime/{id}/comments/{c}");

  let resp = app.call("PUT", &uri, Some(&other), Some(json!({ "body": "hijack" })), None).await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);
  let resp = app.call("PUT", &uri, Some(&moderator), Some(json!({ "body": "fix" })), None).await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);
  let resp = app.call("PUT", &uri, Some(&author), Some(json!({ "body": "edited" })), None).await;
  assert_eq!(resp.status, StatusCode::SEE_OTHER);
  assert_eq!(app.store.get_comment(c).await.unwrap().unwrap().body, "edited");

  let resp = app.call("DELETE", &uri, Some(&other), None, None).await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);
  let resp = app.call("DELETE", &uri, Some(&moderator), None, None).await;
  assert_eq!(resp.status, StatusCode::SEE_OTHER);
  assert!(app.store.get_comment(reply).await.unwrap().is_none());

  let resp = app.call("DELETE", &uri, Some(&author), None, None).await;
  assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reactions_toggle_and_notify_on_like() {
  let app = TestApp::new().await;
  let id = app.anime("A").await;
  let alice = app.user("alice", Role::User).await;
  let bob = app.user("bob", Role::User).await;
  let c = app.comment(id, &alice, None).await;
  let uri = format!("/anime/{id}/comments/{c}/react");

  let likes = |body: &Value| body["comments"][0]["likes"].as_u64().unwrap();

  app.call("POST", &uri, Some(&bob), Some(json!({ "value": 1 })), None).await;
  assert_eq!(likes(&app.get(&format!("/anime/{id}"), None).await.body), 1);
  assert_eq!(app.get("/notifications", Some(&alice)).await.body["unread_count"], 1);

  // Liking again toggles off.
  app.call("POST", &uri, Some(&bob), Some(json!({ "value": 1 })), None).await;
  assert_eq!(likes(&app.get(&format!("/anime/{id}"), None).await.body), 0);

  // A dislike never notifies.
  app.call("POST", &uri, Some(&bob), Some(json!({ "value": -1 })), None).await;
  let detail = app.get(&format!("/anime/{id}"), Some(&bob)).await;
  assert_eq!(detail.body["comments"][0]["dislikes"], 1);
  assert_eq!(detail.body["comments"][0]["user_reaction"], -1);
  assert_eq!(app.get("/notifications", Some(&alice)).await.body["unread_count"], 1);

  let resp = app.call("POST", &uri, Some(&bob), Some(json!({ "value": 5 })), None).await;
  assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ─── Watch lists ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn watch_list_and_profile_counts() {
  let app = TestApp::new().await;
  let a = app.anime("A").await;
  let b = app.anime("B").await;
  let kyon = app.user("Kyon", Role::User).await;

  for (id, status) in [(a, "watching"), (b, "planned"), (a, "completed")] {
    let resp = app
      .call("POST", &format!("/anime/{id}/list"), Some(&kyon), Some(json!({ "status": status })), None)
      .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
  }

  let bad = app
    .call("POST", &format!("/anime/{a}/list"), Some(&kyon), Some(json!({ "status": "binging" })), None)
    .await;
  assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);

  let detail = app.get(&format!("/anime/{a}"), Some(&kyon)).await;
  assert_eq!(detail.body["list_status"], "completed");
  assert_eq!(detail.body["list_status_label"], "Просмотрено");

  let profile = app.get("/users/kyon/anime-list", None).await;
  assert_eq!(profile.status, StatusCode::OK);
  assert_eq!(profile.body["entries"].as_array().unwrap().len(), 2);
  assert_eq!(profile.body["counts"]["completed"], 1);
  assert_eq!(profile.body["counts"]["planned"], 1);
  assert_eq!(profile.body["counts"]["dropped"], 0);
  assert_eq!(profile.body["friends_count"], 0);

  app.call("DELETE", &format!("/anime/{b}/list"), Some(&kyon), None, None).await;
  let profile = app.get("/users/kyon/anime-list", None).await;
  assert_eq!(profile.body["counts"]["planned"], 0);

  assert_eq!(app.get("/users/nobody/anime-list", None).await.status, StatusCode::NOT_FOUND);
}

// ─── Friends ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn friend_requests_flow() {
  let app = TestApp::new().await;
  let alice = app.user("alice", Role::User).await;
  let bob = app.user("bob", Role::User).await;

  let resp = app
    .call("POST", &format!("/friends/request/{}", bob.user_id), Some(&alice), None, None)
    .await;
  assert_eq!(resp.status, StatusCode::SEE_OTHER);
  assert_eq!(resp.location.as_deref(), Some("/friends"));

  let inbox = app.get("/notifications", Some(&bob)).await;
  assert_eq!(inbox.body["items"][0]["data"]["type"], "friend_request");

  let page = app.get("/users/bob/friends", Some(&bob)).await;
  assert_eq!(page.body["is_owner"], true);
  assert_eq!(page.body["incoming"][0]["user"]["username"], "alice");
  let request_id = page.body["incoming"][0]["id"].as_i64().unwrap();

  // Someone else's view hides pending requests.
  let public = app.get("/users/bob/friends", Some(&alice)).await;
  assert_eq!(public.body["incoming"], json!([]));

  // Only the addressee can answer.
  let resp = app
    .call("POST", &format!("/friends/request/{request_id}/accept"), Some(&alice), None, None)
    .await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);

  // Bob sending back accepts the pending request.
  app.call("POST", &format!("/friends/request/{}", alice.user_id), Some(&bob), None, None).await;
  let page = app.get("/users/alice/friends", None).await;
  assert_eq!(page.body["friends"][0]["username"], "bob");
  assert_eq!(app.get("/users/alice/anime-list", None).await.body["friends_count"], 1);

  app.call("DELETE", &format!("/friends/{}", alice.user_id), Some(&bob), None, None).await;
  assert_eq!(app.get("/users/alice/friends", None).await.body["friends"], json!([]));
}

#[tokio::test]
async fn decline_and_cancel() {
  let app = TestApp::new().await;
  let alice = app.user("alice", Role::User).await;
  let bob = app.user("bob", Role::User).await;
  let carol = app.user("carol", Role::User).await;

  app.call("POST", &format!("/friends/request/{}", bob.user_id), Some(&alice), None, None).await;
  app.call("POST", &format!("/friends/request/{}", carol.user_id), Some(&alice), None, None).await;
  let page = app.get("/users/alice/friends", Some(&alice)).await;
  let outgoing = page.body["outgoing"].as_array().unwrap();
  assert_eq!(outgoing.len(), 2);

  let to_bob = outgoing.iter().find(|r| r["user"]["username"] == "bob").unwrap()["id"].as_i64().unwrap();
  let to_carol =
    outgoing.iter().find(|r| r["user"]["username"] == "carol").unwrap()["id"].as_i64().unwrap();

  let resp = app
    .call("POST", &format!("/friends/request/{to_bob}/decline"), Some(&bob), None, None)
    .await;
  assert_eq!(resp.status, StatusCode::SEE_OTHER);

  let resp = app.call("DELETE", &format!("/friends/request/{to_carol}"), Some(&carol), None, None).await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);
  app.call("DELETE", &format!("/friends/request/{to_carol}"), Some(&alice), None, None).await;

  let page = app.get("/users/alice/friends", Some(&alice)).await;
  assert_eq!(page.body["outgoing"], json!([]));
  assert_eq!(page.body["friends"], json!([]));
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notification_inbox_management() {
  let app = TestApp::new().await;
  let alice = app.user("alice", Role::User).await;
  let sender = app.user("sender", Role::User).await;
  let other = app.user("other", Role::User).await;
  app.call("POST", &format!("/friends/request/{}", alice.user_id), Some(&sender), None, None).await;
  app.call("POST", &format!("/friends/request/{}", alice.user_id), Some(&other), None, None).await;

  assert_eq!(app.get("/notifications", None).await.status, StatusCode::UNAUTHORIZED);

  let inbox = app.get("/notifications?limit=0", Some(&alice)).await;
  assert_eq!(inbox.body["items"].as_array().unwrap().len(), 1);
  let id = inbox.body["items"][0]["notification_id"].as_str().unwrap().to_owned();

  let resp = app.call("DELETE", &format!("/notifications/{id}"), Some(&other), None, None).await;
  assert_eq!(resp.status, StatusCode::NOT_FOUND);
  let resp = app.call("DELETE", &format!("/notifications/{id}"), Some(&alice), None, None).await;
  assert_eq!(resp.status, StatusCode::NO_CONTENT);

  let resp = app.call("POST", "/notifications/read", Some(&alice), None, None).await;
  assert_eq!(resp.body["marked"], 1);
  assert_eq!(app.get("/notifications", Some(&alice)).await.body["unread_count"], 0);
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_admin_rules() {
  let app = TestApp::new().await;
  let admin = app.user("admin", Role::Admin).await;
  let moderator = app.user("mod", Role::Moderator).await;
  let plain = app.user("plain", Role::User).await;
  let uri = format!("/admin/users/{}", plain.user_id);

  // A plain user resubmitting their own record cannot change name or role.
  let resp = app
    .call("PUT", &uri, Some(&plain), Some(json!({ "username": "boss", "role": "admin" })), None)
    .await;
  assert_eq!(resp.status, StatusCode::OK);
  assert_eq!(resp.body["username"], "plain");
  assert_eq!(resp.body["role"], "user");

  let resp = app
    .call(
      "PUT",
      &format!("/admin/users/{}", admin.user_id),
      Some(&plain),
      Some(json!({ "username": "x", "role": "user" })),
      None,
    )
    .await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);

  let resp = app
    .call("PUT", &uri, Some(&moderator), Some(json!({ "username": "admin", "role": "user" })), None)
    .await;
  assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

  let resp = app
    .call("PUT", &uri, Some(&moderator), Some(json!({ "username": "renamed", "role": "moderator" })), None)
    .await;
  assert_eq!(resp.body["username"], "renamed");
  assert_eq!(resp.body["role"], "moderator");

  let resp = app.call("DELETE", &uri, Some(&moderator), None, None).await;
  assert_eq!(resp.status, StatusCode::FORBIDDEN);
  let resp = app.call("DELETE", &uri, Some(&admin), None, None).await;
  assert_eq!(resp.status, StatusCode::NO_CONTENT);

  // The deleted user's id now reads as anonymous.
  let resp = app.get("/notifications", Some(&plain)).await;
  assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
