use sea_orm::EntityTrait;
use serde_json::json;
use server::entity::student;

use crate::common::{ADMIN_USERNAME, PASSWORD, TestApp, routes};

#[tokio::test]
async fn admin_creates_a_student_with_profile() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "username": "alice",
                "email": "alice@campus.example.edu",
                "password": PASSWORD,
                "full_name": "Alice Wonder",
                "role": "student",
                "student_number": "2021001234",
                "program_study": "Informatics",
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["role"], "student");
    assert!(res.body["student_id"].is_number());
    assert!(res.body["lecturer_id"].is_null());
    assert!(res.body.get("password").is_none());
}

#[tokio::test]
async fn student_requires_a_student_number() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "username": "alice",
                "email": "alice@campus.example.edu",
                "password": PASSWORD,
                "full_name": "Alice Wonder",
                "role": "student",
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_advisor(&admin, "prof").await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "username": "prof",
                "email": "someone.else@campus.example.edu",
                "password": PASSWORD,
                "full_name": "Another Prof",
                "role": "advisor",
                "lecturer_number": "L-999",
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn unknown_advisor_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "username": "alice",
                "email": "alice@campus.example.edu",
                "password": PASSWORD,
                "full_name": "Alice Wonder",
                "role": "student",
                "student_number": "2021001234",
                "advisor_id": 4242,
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");

    let login = app.login("alice", PASSWORD).await;
    assert_eq!(login.status, 401, "user insert should have rolled back");
}

#[tokio::test]
async fn non_admin_cannot_create_users() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let student = app.create_student(&admin, "alice", None).await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "username": "eve",
                "email": "eve@campus.example.edu",
                "password": PASSWORD,
                "full_name": "Eve",
                "role": "admin",
            }),
            &student.token,
        )
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn assigning_an_advisor_grants_review_scope() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let advisor = app.create_advisor(&admin, "prof").await;
    let student = app.create_student(&admin, "alice", None).await;
    let id = app.create_submitted(&student.token, "Final").await;

    let before = app
        .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &advisor.token)
        .await;
    assert_eq!(before.status, 403);

    let assigned = app
        .put_with_token(
            &routes::student_advisor(student.profile_id.unwrap()),
            &json!({"advisor_id": advisor.profile_id}),
            &admin,
        )
        .await;
    assert_eq!(assigned.status, 200, "{}", assigned.text);
    assert_eq!(assigned.body["advisor_id"], advisor.profile_id.unwrap());

    let after = app
        .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &advisor.token)
        .await;
    assert_eq!(after.status, 200, "{}", after.text);
}

#[tokio::test]
async fn setting_advisor_on_missing_student_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .put_with_token(&routes::student_advisor(777), &json!({"advisor_id": null}), &admin)
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn list_users_is_paginated_newest_first() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_advisor(&admin, "prof").await;
    app.create_student(&admin, "alice", None).await;
    app.create_student(&admin, "bob", None).await;

    let first = app
        .get_with_token(&format!("{}?page=1&page_size=2", routes::USERS), &admin)
        .await;
    assert_eq!(first.status, 200, "{}", first.text);
    let names: Vec<&str> = first.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["bob", "alice"]);
    assert!(first.body["data"][0]["student_id"].is_number());
    assert_eq!(first.body["pagination"]["total_items"], 4);
    assert_eq!(first.body["pagination"]["total_pages"], 2);

    let second = app
        .get_with_token(&format!("{}?page=2&page_size=2", routes::USERS), &admin)
        .await;
    let names: Vec<&str> = second.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["prof", ADMIN_USERNAME]);
    assert!(second.body["data"][0]["lecturer_id"].is_number());
}

#[tokio::test]
async fn get_user_returns_profile_ids() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let advisor = app.create_advisor(&admin, "prof").await;

    let res = app
        .get_with_token(&routes::user(advisor.user_id), &admin)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["username"], "prof");
    assert_eq!(res.body["role"], "advisor");
    assert_eq!(res.body["lecturer_id"], advisor.profile_id.unwrap());
    assert!(res.body["student_id"].is_null());
    assert!(res.body.get("password").is_none());
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    assert_eq!(app.get_with_token(&routes::user(9999), &admin).await.status, 404);
    assert_eq!(
        app.put_with_token(&routes::user(9999), &json!({"full_name": "X"}), &admin)
            .await
            .status,
        404
    );
    assert_eq!(app.delete_with_token(&routes::user(9999), &admin).await.status, 404);
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let alice = app.create_student(&admin, "alice", None).await;

    let res = app
        .put_with_token(
            &routes::user(alice.user_id),
            &json!({"full_name": "  Alice Liddell  "}),
            &admin,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["full_name"], "Alice Liddell");
    assert_eq!(res.body["email"], "alice@campus.example.edu");
    assert_eq!(res.body["is_active"], true);
    assert_eq!(res.body["student_id"], alice.profile_id.unwrap());
}

#[tokio::test]
async fn update_rejects_invalid_and_taken_emails() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let alice = app.create_student(&admin, "alice", None).await;
    app.create_student(&admin, "bob", None).await;

    let invalid = app
        .put_with_token(&routes::user(alice.user_id), &json!({"email": "nope"}), &admin)
        .await;
    assert_eq!(invalid.status, 400);
    assert_eq!(invalid.body["code"], "VALIDATION_ERROR");

    let taken = app
        .put_with_token(
            &routes::user(alice.user_id),
            &json!({"email": "bob@campus.example.edu"}),
            &admin,
        )
        .await;
    assert_eq!(taken.status, 409);
    assert_eq!(taken.body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn update_can_deactivate_and_reactivate() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let alice = app.create_student(&admin, "alice", None).await;

    let off = app
        .put_with_token(&routes::user(alice.user_id), &json!({"is_active": false}), &admin)
        .await;
    assert_eq!(off.status, 200, "{}", off.text);
    assert_eq!(off.body["is_active"], false);
    assert_eq!(app.login("alice", PASSWORD).await.status, 401);

    let on = app
        .put_with_token(&routes::user(alice.user_id), &json!({"is_active": true}), &admin)
        .await;
    assert_eq!(on.body["is_active"], true);
    assert_eq!(app.login("alice", PASSWORD).await.status, 200);
}

#[tokio::test]
async fn delete_deactivates_but_keeps_the_account() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let alice = app.create_student(&admin, "alice", None).await;

    let res = app.delete_with_token(&routes::user(alice.user_id), &admin).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let again = app.delete_with_token(&routes::user(alice.user_id), &admin).await;
    assert_eq!(again.status, 204);

    let fetched = app.get_with_token(&routes::user(alice.user_id), &admin).await;
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body["is_active"], false);
    assert_eq!(fetched.body["student_id"], alice.profile_id.unwrap());
    assert_eq!(app.login("alice", PASSWORD).await.status, 401);

    let profile = student::Entity::find_by_id(alice.profile_id.unwrap())
        .one(&app.db)
        .await
        .unwrap();
    assert_eq!(profile.map(|p| p.user_id), Some(alice.user_id));
}

#[tokio::test]
async fn admin_cannot_deactivate_themselves() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let me = app.get_with_token(routes::PROFILE, &admin).await.id();

    let deleted = app.delete_with_token(&routes::user(me), &admin).await;
    assert_eq!(deleted.status, 400);
    assert_eq!(deleted.body["code"], "VALIDATION_ERROR");

    let updated = app
        .put_with_token(&routes::user(me), &json!({"is_active": false}), &admin)
        .await;
    assert_eq!(updated.status, 400);
    assert_eq!(app.login(ADMIN_USERNAME, PASSWORD).await.status, 200);
}

#[tokio::test]
async fn user_management_requires_permission() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let advisor = app.create_advisor(&admin, "prof").await;
    let student = app.create_student(&admin, "alice", None).await;

    let list = app.get_with_token(routes::USERS, &advisor.token).await;
    assert_eq!(list.status, 403);
    assert_eq!(list.body["code"], "PERMISSION_DENIED");

    let get = app
        .get_with_token(&routes::user(advisor.user_id), &student.token)
        .await;
    assert_eq!(get.status, 403);

    let update = app
        .put_with_token(
            &routes::user(student.user_id),
            &json!({"is_active": true}),
            &student.token,
        )
        .await;
    assert_eq!(update.status, 403);

    let delete = app
        .delete_with_token(&routes::user(advisor.user_id), &advisor.token)
        .await;
    assert_eq!(delete.status, 403);
    assert_eq!(app.login("prof", PASSWORD).await.status, 200);
}
