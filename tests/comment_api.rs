mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Timelike, Utc};
use blog_server::comments::CommentTreeManager;
use blog_server::constants::MAX_COMMENT_DEPTH;
use blog_server::repositories::MemoryStore;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use common::helpers::{
    comment_tree, create_test_app, create_test_app_with_store, create_test_comment, create_test_post, send,
    send_raw, signup,
};

// --- Comment Tests ---

#[tokio::test]
async fn test_reply_is_nested_under_parent() {
    let app = create_test_app();
    let (token, user_id) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Trees", "Tech").await;

    let c1 = create_test_comment(&app, &token, post_id, "top level", None).await;
    let c2 = create_test_comment(&app, &token, post_id, "a reply", Some(c1)).await;

    let tree = comment_tree(&app, post_id).await;
    let roots = tree.as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["id"], c1.to_string());
    assert_eq!(roots[0]["author"]["id"], user_id.to_string());
    assert_eq!(roots[0]["author"]["name"], "Alice");

    let replies = roots[0]["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], c2.to_string());
    assert_eq!(replies[0]["parentId"], c1.to_string());
    assert_eq!(replies[0]["replies"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_siblings_keep_creation_order() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Order", "Other").await;

    let parent = create_test_comment(&app, &token, post_id, "parent", None).await;
    let first = create_test_comment(&app, &token, post_id, "first", Some(parent)).await;
    let second = create_test_comment(&app, &token, post_id, "second", Some(parent)).await;
    let later_root = create_test_comment(&app, &token, post_id, "another root", None).await;

    let tree = comment_tree(&app, post_id).await;
    let roots = tree.as_array().unwrap();
    assert_eq!(roots[0]["id"], parent.to_string());
    assert_eq!(roots[1]["id"], later_root.to_string());
    let replies = roots[0]["replies"].as_array().unwrap();
    assert_eq!(replies[0]["id"], first.to_string());
    assert_eq!(replies[1]["id"], second.to_string());
}

#[tokio::test]
async fn test_edit_by_other_user_is_forbidden() {
    let app = create_test_app();
    let (alice, _) = signup(&app, "Alice").await;
    let (bob, _) = signup(&app, "Bob").await;
    let post_id = create_test_post(&app, &alice, "Ownership", "Tech").await;
    let comment_id = create_test_comment(&app, &alice, post_id, "mine", None).await;

    let uri = format!("/api/posts/{}/comments/{}", post_id, comment_id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&bob), Some(json!({ "content": "hijack" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let tree = comment_tree(&app, post_id).await;
    assert_eq!(tree[0]["content"], "mine");
    assert_eq!(tree[0]["isEdited"], false);
}

#[tokio::test]
async fn test_edit_sets_content_and_flag() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Edits", "Tech").await;
    let comment_id = create_test_comment(&app, &token, post_id, "draft", None).await;

    let uri = format!("/api/posts/{}/comments/{}", post_id, comment_id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "content": "  final  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "final");
    assert_eq!(body["isEdited"], true);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "content": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Content is required");
}

#[tokio::test]
async fn test_parent_from_other_post_is_rejected() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_a = create_test_post(&app, &token, "A", "Tech").await;
    let post_b = create_test_post(&app, &token, "B", "Tech").await;
    let on_a = create_test_comment(&app, &token, post_a, "on A", None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/comments", post_b),
        Some(&token),
        Some(json!({ "content": "cross", "parentId": on_a })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(comment_tree(&app, post_b).await, json!([]));
}

#[tokio::test]
async fn test_unknown_parent_and_post_are_not_found() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "A", "Tech").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/comments", post_id),
        Some(&token),
        Some(json!({ "content": "orphan", "parentId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Parent comment not found");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/comments", Uuid::new_v4()),
        Some(&token),
        Some(json!({ "content": "nowhere" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/posts/{}/comments", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_whole_subtree() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Cascade", "Tech").await;

    let root = create_test_comment(&app, &token, post_id, "root", None).await;
    let child = create_test_comment(&app, &token, post_id, "child", Some(root)).await;
    create_test_comment(&app, &token, post_id, "grandchild", Some(child)).await;
    let survivor = create_test_comment(&app, &token, post_id, "survivor", None).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/posts/{}/comments/{}", post_id, root),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let tree = comment_tree(&app, post_id).await;
    let roots = tree.as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["id"], survivor.to_string());

    // replying to a deleted descendant fails
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/comments", post_id),
        Some(&token),
        Some(json!({ "content": "late", "parentId": child })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_addressed_through_wrong_post_is_not_found() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_a = create_test_post(&app, &token, "A", "Tech").await;
    let post_b = create_test_post(&app, &token, "B", "Tech").await;
    let comment_id = create_test_comment(&app, &token, post_a, "on A", None).await;

    let uri = format!("/api/posts/{}/comments/{}", post_b, comment_id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "content": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(comment_tree(&app, post_a).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_commenting_requires_a_token() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Auth", "Tech").await;
    let uri = format!("/api/posts/{}/comments", post_id);

    let (status, body) = send(&app, Method::POST, &uri, None, Some(json!({ "content": "anon" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, body) = send(&app, Method::POST, &uri, Some("garbage"), Some(json!({ "content": "anon" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_reading_the_tree_is_idempotent() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Stable", "Tech").await;
    let root = create_test_comment(&app, &token, post_id, "root", None).await;
    create_test_comment(&app, &token, post_id, "reply", Some(root)).await;

    let first = comment_tree(&app, post_id).await;
    let second = comment_tree(&app, post_id).await;
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deepest_allowed_chain_renders_on_a_worker_thread() {
    let store = MemoryStore::new();
    let app = create_test_app_with_store(store.clone());
    let (token, user_id) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Deep", "Tech").await;

    let manager = CommentTreeManager::new(Arc::new(store));
    let mut parent = None;
    for level in 0..MAX_COMMENT_DEPTH {
        let comment = manager
            .create_comment(post_id, user_id, &format!("level {}", level), parent)
            .await
            .unwrap();
        parent = Some(comment.id);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/comments", post_id),
        Some(&token),
        Some(json!({ "content": "one too deep", "parentId": parent })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // Rendered on a runtime worker, which has the default 2 MiB stack.
    for uri in [format!("/api/posts/{}", post_id), format!("/api/posts/{}/comments", post_id)] {
        let app = app.clone();
        let (status, bytes) = tokio::spawn(async move { send_raw(&app, Method::GET, &uri, None, None).await })
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.matches("\"replies\"").count(), MAX_COMMENT_DEPTH);
    }
}

#[tokio::test]
async fn test_created_comment_matches_what_is_read_back() {
    let app = create_test_app();
    let (token, _) = signup(&app, "Alice").await;
    let post_id = create_test_post(&app, &token, "Stamps", "Tech").await;

    let (status, created) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/comments", post_id),
        Some(&token),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let created_at = created["createdAt"].as_str().unwrap();
    let stamp: DateTime<Utc> = created_at.parse().unwrap();
    assert_eq!(stamp.nanosecond() % 1_000, 0);

    let tree = comment_tree(&app, post_id).await;
    assert_eq!(tree[0]["createdAt"], created["createdAt"]);
    assert_eq!(tree[0]["updatedAt"], created["updatedAt"]);
}
