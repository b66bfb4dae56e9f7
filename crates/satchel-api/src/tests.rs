//! Router-level integration tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use satchel_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(value) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      builder.body(Body::from(value.to_string())).unwrap()
    }
    None => builder.body(Body::empty()).unwrap(),
  };

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

/// POST and return the `field` of the created entity, asserting 201.
async fn create_id(app: &Router, uri: &str, body: Value, field: &str) -> String {
  let (status, value) = send(app, "POST", uri, Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
  value[field].as_str().unwrap().to_string()
}

// ─── The end-to-end resolution scenario ──────────────────────────────────────

#[tokio::test]
async fn effective_needs_follow_assignment_and_override_lifecycle() {
  let app = app().await;

  let need_id = create_id(
    &app,
    "/needs",
    json!({"name": "Hearing support", "short_description": "FM system"}),
    "need_id",
  )
  .await;
  let category_id = create_id(
    &app,
    "/categories",
    json!({"category_name": "SEN"}),
    "category_id",
  )
  .await;
  let (status, _) = send(
    &app,
    "POST",
    "/category-needs",
    Some(json!({"category_id": category_id, "need_id": need_id})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let pupil_id = create_id(
    &app,
    "/pupils",
    json!({"first_name": "Priya", "last_name": "Shah"}),
    "pupil_id",
  )
  .await;

  let effective_uri =
    format!("/pupil-categories/{pupil_id}/effective-needs");

  // Nothing assigned yet: empty, not an error.
  let (status, needs) = send(&app, "GET", &effective_uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(needs.as_array().unwrap().len(), 0);

  let (status, _) = send(
    &app,
    "POST",
    "/pupil-categories/assign-category",
    Some(json!({"pupil_id": pupil_id, "category_id": category_id})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, needs) = send(&app, "GET", &effective_uri, None).await;
  let needs = needs.as_array().unwrap().clone();
  assert_eq!(needs.len(), 1);
  assert_eq!(needs[0]["name"], "Hearing support");
  assert_eq!(needs[0]["sources"], "SEN");

  // A removal override empties the set…
  let (status, record) = send(
    &app,
    "POST",
    "/pupil-categories/need-override",
    Some(json!({
      "pupil_id": pupil_id,
      "need_id": need_id,
      "is_added": false,
      "notes": "no longer needed",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let override_id = record["override_id"].as_str().unwrap().to_string();

  let (_, needs) = send(&app, "GET", &effective_uri, None).await;
  assert_eq!(needs.as_array().unwrap().len(), 0);

  // …and deleting it restores the category grant.
  let (status, _) = send(
    &app,
    "DELETE",
    &format!("/pupil-categories/need-override/{override_id}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, needs) = send(&app, "GET", &effective_uri, None).await;
  let needs = needs.as_array().unwrap().clone();
  assert_eq!(needs.len(), 1);
  assert_eq!(needs[0]["sources"], "SEN");
}

#[tokio::test]
async fn editing_an_override_flips_the_resolution() {
  let app = app().await;

  let need_id =
    create_id(&app, "/needs", json!({"name": "Large print"}), "need_id")
      .await;
  let category_id = create_id(
    &app,
    "/categories",
    json!({"category_name": "Visual impairment"}),
    "category_id",
  )
  .await;
  send(
    &app,
    "POST",
    "/category-needs",
    Some(json!({"category_id": category_id, "need_id": need_id})),
  )
  .await;
  let pupil_id = create_id(
    &app,
    "/pupils",
    json!({"first_name": "Tom", "last_name": "Adler"}),
    "pupil_id",
  )
  .await;
  send(
    &app,
    "POST",
    "/pupil-categories/assign-category",
    Some(json!({"pupil_id": pupil_id, "category_id": category_id})),
  )
  .await;

  let (_, record) = send(
    &app,
    "POST",
    "/pupil-categories/need-override",
    Some(json!({
      "pupil_id": pupil_id,
      "need_id": need_id,
      "is_added": false,
      "notes": null,
    })),
  )
  .await;
  let override_id = record["override_id"].as_str().unwrap().to_string();

  let effective_uri =
    format!("/pupil-categories/{pupil_id}/effective-needs");
  let (_, needs) = send(&app, "GET", &effective_uri, None).await;
  assert_eq!(needs.as_array().unwrap().len(), 0);

  let (status, updated) = send(
    &app,
    "PUT",
    &format!("/pupil-categories/need-override/{override_id}"),
    Some(json!({"is_added": true, "notes": "reinstated"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["is_added"], true);

  let (_, needs) = send(&app, "GET", &effective_uri, None).await;
  let needs = needs.as_array().unwrap().clone();
  assert_eq!(needs.len(), 1);
  // Category provenance masks the now-redundant addition override.
  assert_eq!(needs[0]["sources"], "Visual impairment");
}

// ─── Validation and error mapping ────────────────────────────────────────────

#[tokio::test]
async fn blank_pupil_names_are_rejected() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/pupils",
    Some(json!({"first_name": "Priya", "last_name": "  "})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("last_name"));
}

#[tokio::test]
async fn missing_override_fields_are_a_client_error() {
  let app = app().await;
  let (status, _) = send(
    &app,
    "POST",
    "/pupil-categories/need-override",
    Some(json!({"notes": "missing ids"})),
  )
  .await;
  assert!(status.is_client_error());
}

#[tokio::test]
async fn duplicate_assignment_returns_conflict() {
  let app = app().await;
  let pupil_id = create_id(
    &app,
    "/pupils",
    json!({"first_name": "Priya", "last_name": "Shah"}),
    "pupil_id",
  )
  .await;
  let category_id = create_id(
    &app,
    "/categories",
    json!({"category_name": "SEN"}),
    "category_id",
  )
  .await;

  let body = json!({"pupil_id": pupil_id, "category_id": category_id});
  let (status, _) = send(
    &app,
    "POST",
    "/pupil-categories/assign-category",
    Some(body.clone()),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, error) = send(
    &app,
    "POST",
    "/pupil-categories/assign-category",
    Some(body),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(error["error"].as_str().unwrap().contains("already assigned"));
}

#[tokio::test]
async fn deleting_a_referenced_need_returns_conflict() {
  let app = app().await;
  let need_id = create_id(
    &app,
    "/needs",
    json!({"name": "Hearing support"}),
    "need_id",
  )
  .await;
  let category_id = create_id(
    &app,
    "/categories",
    json!({"category_name": "SEN"}),
    "category_id",
  )
  .await;
  send(
    &app,
    "POST",
    "/category-needs",
    Some(json!({"category_id": category_id, "need_id": need_id})),
  )
  .await;

  let (status, _) = send(&app, "DELETE", &format!("/needs/{need_id}"), None)
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_ids_return_not_found() {
  let app = app().await;
  let missing = uuid::Uuid::new_v4();

  let (status, _) =
    send(&app, "GET", &format!("/pupils/{missing}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &app,
    "DELETE",
    &format!("/pupil-categories/need-override/{missing}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Profile aggregation ─────────────────────────────────────────────────────

#[tokio::test]
async fn profile_aggregates_by_name_search() {
  let app = app().await;

  let form_id = create_id(
    &app,
    "/forms",
    json!({"form_name": "7B", "form_year": 7, "teacher_name": "Ms Okafor"}),
    "form_id",
  )
  .await;
  let pupil_id = create_id(
    &app,
    "/pupils",
    json!({
      "first_name": "Priya",
      "last_name": "Shah",
      "form_id": form_id,
      "notes": "front row seat",
    }),
    "pupil_id",
  )
  .await;

  let need_id = create_id(
    &app,
    "/needs",
    json!({"name": "Hearing support"}),
    "need_id",
  )
  .await;
  let category_id = create_id(
    &app,
    "/categories",
    json!({"category_name": "SEN"}),
    "category_id",
  )
  .await;
  send(
    &app,
    "POST",
    "/category-needs",
    Some(json!({"category_id": category_id, "need_id": need_id})),
  )
  .await;
  send(
    &app,
    "POST",
    "/pupil-categories/assign-category",
    Some(json!({"pupil_id": pupil_id, "category_id": category_id})),
  )
  .await;

  let (status, profile) =
    send(&app, "GET", "/pupils/profile?name=priya%20sh", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["pupil_id"].as_str().unwrap(), pupil_id);
  assert_eq!(profile["form"]["form_name"], "7B");
  assert_eq!(profile["categories"].as_array().unwrap().len(), 1);
  assert_eq!(profile["effective_needs"][0]["sources"], "SEN");
  assert_eq!(profile["need_overrides"].as_array().unwrap().len(), 0);
  assert_eq!(profile["devices"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn profile_requires_an_identifier() {
  let app = app().await;
  let (status, _) = send(&app, "GET", "/pupils/profile", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) =
    send(&app, "GET", "/pupils/profile?name=nobody", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_updates_partially_and_unassigns_form() {
  let app = app().await;
  let form_id = create_id(
    &app,
    "/forms",
    json!({"form_name": "9C", "form_year": 9, "teacher_name": "Mr Hale"}),
    "form_id",
  )
  .await;
  let pupil_id = create_id(
    &app,
    "/pupils",
    json!({"first_name": "Noah", "last_name": "Price", "form_id": form_id}),
    "pupil_id",
  )
  .await;

  let (status, updated) = send(
    &app,
    "PATCH",
    &format!("/pupils/{pupil_id}"),
    Some(json!({"form_id": null, "notes": "moved house"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["first_name"], "Noah");
  assert_eq!(updated["form_id"], Value::Null);
  assert_eq!(updated["notes"], "moved house");
}

// ─── CSV import ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn csv_upload_inserts_rows_sequentially() {
  let app = app().await;

  let boundary = "X-SATCHEL-TEST-BOUNDARY";
  let csv = "first_name,last_name,form_id,notes\r\n\
             Priya,Shah,,\r\n\
             Tom,Adler,,left-handed\r\n";
  let body = format!(
    "--{boundary}\r\n\
     Content-Disposition: form-data; name=\"csvfile\"; filename=\"pupils.csv\"\r\n\
     Content-Type: text/csv\r\n\r\n\
     {csv}\r\n\
     --{boundary}--\r\n"
  );

  let request = Request::builder()
    .method("POST")
    .uri("/pupils/upload")
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={boundary}"),
    )
    .body(Body::from(body))
    .unwrap();

  let response = app.clone().oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(value["count"], 2);

  let (_, pupils) = send(&app, "GET", "/pupils", None).await;
  let pupils = pupils.as_array().unwrap().clone();
  assert_eq!(pupils.len(), 2);
  assert_eq!(pupils[0]["last_name"], "Adler");
  assert_eq!(pupils[0]["notes"], "left-handed");
}
