mod common;

use anyhow::Result;
use common::TestServer;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn create_assigns_owner_from_token() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, me) = server.register("owner@club.io", "Owner", "professional").await?;
    let (_, other) = server.register("other@club.io", "Other", "professional").await?;

    let res = server
        .post("/anthropometric", &token)
        .json(&json!({
            "weight": 72.5,
            "height": 181,
            "ownerId": other["id"],
            "userId": other["id"]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let created: Value = res.json().await?;
    assert_eq!(created["ownerId"], me["id"]);
    assert_eq!(created["weight"], json!(72.5));
    assert!(created.get("userId").is_none());
    assert!(created["date"].is_string());
    Ok(())
}

#[tokio::test]
async fn lists_are_scoped_to_owner() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (alice, _) = server.register("alice@club.io", "Alice", "professional").await?;
    let (bob, _) = server.register("bob@club.io", "Bob", "athlete").await?;

    for weight in [70, 71] {
        server
            .post("/anthropometric", &alice)
            .json(&json!({ "weight": weight }))
            .send()
            .await?
            .error_for_status()?;
    }
    server
        .post("/anthropometric", &bob)
        .json(&json!({ "weight": 90 }))
        .send()
        .await?
        .error_for_status()?;

    let mine: Vec<Value> = server.get("/anthropometric", &alice).send().await?.json().await?;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|m| m["weight"] != json!(90)));

    let theirs: Vec<Value> = server.get("/anthropometric", &bob).send().await?.json().await?;
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0]["weight"], json!(90));
    Ok(())
}

#[tokio::test]
async fn non_owner_cannot_modify_record() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (owner, _) = server.register("own@club.io", "Own", "professional").await?;
    let (intruder, _) = server.register("in@club.io", "Intruder", "professional").await?;

    let created: Value = server
        .post("/performance", &owner)
        .json(&json!({ "sprintTime": 11.2 }))
        .send()
        .await?
        .json()
        .await?;
    let path = format!("/performance/{}", id_of(&created));

    let res = server
        .put(&path, &intruder)
        .json(&json!({ "sprintTime": 9.0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.delete(&path, &intruder).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Record is untouched
    let list: Vec<Value> = server.get("/performance", &owner).send().await?.json().await?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["sprintTime"], json!(11.2));
    Ok(())
}

#[tokio::test]
async fn owner_updates_and_deletes() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.register("hr@club.io", "Hr", "athlete").await?;

    let created: Value = server
        .post("/health", &token)
        .json(&json!({ "heartRate": 62, "sleepHours": 7 }))
        .send()
        .await?
        .json()
        .await?;
    let path = format!("/health/{}", id_of(&created));

    let res = server
        .put(&path, &token)
        .json(&json!({ "heartRate": 58 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["heartRate"], json!(58));
    assert_eq!(updated["sleepHours"], json!(7));
    assert_eq!(updated["id"], created["id"]);

    let res = server.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Measurement deleted successfully");

    let res = server.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let list: Vec<Value> = server.get("/health", &token).send().await?.json().await?;
    assert!(list.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_ids() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.register("ids@club.io", "Ids", "athlete").await?;

    let res = server
        .put(&format!("/anthropometric/{}", uuid::Uuid::new_v4()), &token)
        .json(&json!({ "weight": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.delete("/anthropometric/not-an-id", &token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn kinds_are_separate_collections() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.register("kinds@club.io", "Kinds", "athlete").await?;

    let created: Value = server
        .post("/anthropometric", &token)
        .json(&json!({ "weight": 65 }))
        .send()
        .await?
        .json()
        .await?;

    // The same id is unknown under another kind
    let res = server
        .delete(&format!("/health/{}", id_of(&created)), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server
        .post("/performance", &token)
        .json(&json!({ "verticalJump": 48 }))
        .send()
        .await?
        .error_for_status()?;

    let overview: Value = server.get("/measurements", &token).send().await?.json().await?;
    assert_eq!(overview["anthropometric"].as_array().map(Vec::len), Some(1));
    assert_eq!(overview["performance"].as_array().map(Vec::len), Some(1));
    assert_eq!(overview["health"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn invalid_measurement_bodies_are_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.register("bad@club.io", "Bad", "athlete").await?;

    let res = server
        .post("/anthropometric", &token)
        .json(&json!({ "weight": "heavy" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/anthropometric", &token)
        .json(&json!({ "athleteId": uuid::Uuid::new_v4() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/anthropometric", &token)
        .header("content-type", "application/json")
        .body("[1, 2")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let list: Vec<Value> = server.get("/anthropometric", &token).send().await?.json().await?;
    assert!(list.is_empty());
    Ok(())
}
