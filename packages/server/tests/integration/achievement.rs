use serde_json::json;

use crate::common::{TestApp, competition, routes};

mod authoring {
    use super::*;

    #[tokio::test]
    async fn student_creates_a_draft_with_its_content() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;

        let res = app
            .post_with_token(routes::ACHIEVEMENTS, &competition("  Regional Final  ", 15), &student.token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "draft");
        assert_eq!(res.body["student_id"], student.profile_id.unwrap());
        assert!(res.body["submitted_at"].is_null());
        assert_eq!(res.body["content"]["title"], "Regional Final");
        assert_eq!(res.body["content"]["achievement_type"], "competition");
        assert_eq!(res.body["content"]["points"], 15);
        assert_eq!(
            res.body["content_id"], res.body["content"]["id"],
            "reference should point at the stored content"
        );
        assert_eq!(app.documents.len().await, 1);
    }

    #[tokio::test]
    async fn create_rejects_an_empty_title() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;

        let res = app
            .post_with_token(routes::ACHIEVEMENTS, &competition("   ", 5), &student.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.documents.is_empty().await);
    }

    #[tokio::test]
    async fn create_rejects_an_unknown_achievement_type() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;

        let res = app
            .post_with_token(
                routes::ACHIEVEMENTS,
                &json!({
                    "title": "Something",
                    "details": {"achievement_type": "sports"},
                }),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn advisor_cannot_author_achievements() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let advisor = app.create_advisor(&admin, "bob").await;

        let res = app
            .post_with_token(routes::ACHIEVEMENTS, &competition("Mine", 5), &advisor.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_without_student_profile_cannot_create() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::ACHIEVEMENTS, &competition("Mine", 5), &admin)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert!(app.documents.is_empty().await);
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ACHIEVEMENTS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn owner_updates_a_draft() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_achievement(&student.token, "Draft", 5).await;

        let res = app
            .put_with_token(
                &routes::achievement(id),
                &json!({"title": "Renamed", "points": 20}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["content"]["title"], "Renamed");
        assert_eq!(res.body["content"]["points"], 20);
        assert_eq!(res.body["content"]["description"], "Regional final");
        assert_eq!(res.body["status"], "draft");
    }

    #[tokio::test]
    async fn update_cannot_change_the_achievement_type() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_achievement(&student.token, "Draft", 5).await;

        let res = app
            .put_with_token(
                &routes::achievement(id),
                &json!({"details": {"achievement_type": "publication", "publication_title": "Paper"}}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn another_student_cannot_update() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_student(&admin, "alice", None).await;
        let mallory = app.create_student(&admin, "mallory", None).await;
        let id = app.create_achievement(&alice.token, "Draft", 5).await;

        let res = app
            .put_with_token(&routes::achievement(id), &json!({"title": "Mine"}), &mallory.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn submitted_achievement_cannot_be_updated() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Submitted").await;

        let res = app
            .put_with_token(&routes::achievement(id), &json!({"title": "Late"}), &student.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn missing_achievement_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(&routes::achievement(9999), &admin).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn owner_deletes_a_draft_and_its_content() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_achievement(&student.token, "Draft", 5).await;

        let res = app
            .delete_with_token(&routes::achievement(id), &student.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let get = app.get_with_token(&routes::achievement(id), &student.token).await;
        assert_eq!(get.status, 404);
        assert!(app.documents.is_empty().await);
    }

    #[tokio::test]
    async fn submitted_achievement_survives_a_delete_attempt() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Submitted").await;

        let res = app
            .delete_with_token(&routes::achievement(id), &student.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_STATE");

        let get = app.get_with_token(&routes::achievement(id), &student.token).await;
        assert_eq!(get.status, 200);
        assert_eq!(get.body["status"], "submitted");
        assert!(get.body["content"].is_object());
        assert_eq!(app.documents.len().await, 1);
    }

    #[tokio::test]
    async fn another_student_cannot_delete() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_student(&admin, "alice", None).await;
        let mallory = app.create_student(&admin, "mallory", None).await;
        let id = app.create_achievement(&alice.token, "Draft", 5).await;

        let res = app
            .delete_with_token(&routes::achievement(id), &mallory.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(app.documents.len().await, 1);
    }
}

mod review {
    use super::*;

    #[tokio::test]
    async fn advisor_verifies_an_advisee_submission() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let advisor = app.create_advisor(&admin, "prof").await;
        let student = app
            .create_student(&admin, "alice", advisor.profile_id)
            .await;
        let id = app.create_submitted(&student.token, "Final").await;

        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &advisor.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "verified");
        assert_eq!(res.body["verified_by"], advisor.user_id);
        assert!(res.body["verified_at"].is_string());
    }

    #[tokio::test]
    async fn reject_then_edit_then_resubmit() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let advisor = app.create_advisor(&admin, "prof").await;
        let student = app
            .create_student(&admin, "alice", advisor.profile_id)
            .await;
        let id = app.create_submitted(&student.token, "Final").await;

        let rejected = app
            .post_with_token(
                &routes::verify(id),
                &json!({"action": "reject", "note": "missing proof"}),
                &advisor.token,
            )
            .await;
        assert_eq!(rejected.status, 200, "{}", rejected.text);
        assert_eq!(rejected.body["status"], "rejected");
        assert_eq!(rejected.body["rejection_note"], "missing proof");
        assert_eq!(rejected.body["verified_by"], advisor.user_id);

        let updated = app
            .put_with_token(
                &routes::achievement(id),
                &json!({"description": "Certificate attached"}),
                &student.token,
            )
            .await;
        assert_eq!(updated.status, 200, "{}", updated.text);

        let resubmitted = app
            .post_with_token(&routes::submit(id), &json!({}), &student.token)
            .await;
        assert_eq!(resubmitted.status, 200, "{}", resubmitted.text);
        assert_eq!(resubmitted.body["status"], "submitted");
        assert!(resubmitted.body["rejection_note"].is_null());
        assert!(resubmitted.body["verified_by"].is_null());
        assert!(resubmitted.body["submitted_at"].is_string());
    }

    #[tokio::test]
    async fn unrelated_advisor_cannot_review() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let advisor = app.create_advisor(&admin, "prof").await;
        let stranger = app.create_advisor(&admin, "other_prof").await;
        let student = app
            .create_student(&admin, "alice", advisor.profile_id)
            .await;
        let id = app.create_submitted(&student.token, "Final").await;

        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &stranger.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let get = app.get_with_token(&routes::achievement(id), &student.token).await;
        assert_eq!(get.body["status"], "submitted");
    }

    #[tokio::test]
    async fn admin_reviews_any_submission() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Final").await;

        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "verified");
    }

    #[tokio::test]
    async fn draft_cannot_be_reviewed() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_achievement(&student.token, "Draft", 5).await;

        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn verified_achievement_is_terminal() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Final").await;
        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &admin)
            .await;
        assert_eq!(res.status, 200);

        let again = app
            .post_with_token(&routes::verify(id), &json!({"action": "reject"}), &admin)
            .await;
        assert_eq!(again.status, 409);

        let resubmit = app
            .post_with_token(&routes::submit(id), &json!({}), &student.token)
            .await;
        assert_eq!(resubmit.status, 409);
        assert_eq!(resubmit.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn unknown_action_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Final").await;

        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "approve"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn students_cannot_review_their_own_work() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Final").await;

        let res = app
            .post_with_token(&routes::verify(id), &json!({"action": "verify"}), &student.token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod attachments {
    use super::*;

    #[tokio::test]
    async fn owner_attaches_a_file_to_a_draft() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_achievement(&student.token, "Draft", 5).await;

        let res = app
            .post_with_token(
                &routes::attachments(id),
                &json!({
                    "file_name": "certificate.pdf",
                    "file_url": "https://files.example.com/certificate.pdf",
                    "file_type": "application/pdf",
                }),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "certificate.pdf");
        assert!(res.body["uploaded_at"].is_string());

        let get = app.get_with_token(&routes::achievement(id), &student.token).await;
        let attachments = get.body["content"]["attachments"].as_array().unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0]["file_type"], "application/pdf");
    }

    #[tokio::test]
    async fn submitted_achievement_takes_no_attachments() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_submitted(&student.token, "Final").await;

        let res = app
            .post_with_token(
                &routes::attachments(id),
                &json!({"file_name": "late.pdf", "file_url": "https://files.example.com/late.pdf"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn attachment_requires_a_file_name() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        let id = app.create_achievement(&student.token, "Draft", 5).await;

        let res = app
            .post_with_token(
                &routes::attachments(id),
                &json!({"file_name": " ", "file_url": "https://files.example.com/x.pdf"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn students_see_only_their_own() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_student(&admin, "alice", None).await;
        let bob = app.create_student(&admin, "bob", None).await;
        app.create_achievement(&alice.token, "Alice 1", 5).await;
        app.create_achievement(&alice.token, "Alice 2", 5).await;
        let bobs = app.create_achievement(&bob.token, "Bob 1", 5).await;

        let res = app.get_with_token(routes::ACHIEVEMENTS, &alice.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total_items"], 2);
        let data = res.body["data"].as_array().unwrap();
        assert!(data.iter().all(|a| a["student_id"] == alice.profile_id.unwrap()));

        let peek = app.get_with_token(&routes::achievement(bobs), &alice.token).await;
        assert_eq!(peek.status, 403);
    }

    #[tokio::test]
    async fn advisors_see_their_advisees() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let advisor = app.create_advisor(&admin, "prof").await;
        let advisee = app
            .create_student(&admin, "alice", advisor.profile_id)
            .await;
        let other = app.create_student(&admin, "bob", None).await;
        app.create_achievement(&advisee.token, "Advised", 5).await;
        app.create_achievement(&other.token, "Unadvised", 5).await;

        let res = app.get_with_token(routes::ACHIEVEMENTS, &advisor.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["content"]["title"], "Advised");
    }

    #[tokio::test]
    async fn advisor_without_advisees_gets_an_empty_page() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let advisor = app.create_advisor(&admin, "prof").await;
        let student = app.create_student(&admin, "alice", None).await;
        app.create_achievement(&student.token, "Unadvised", 5).await;

        let res = app.get_with_token(routes::ACHIEVEMENTS, &advisor.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["total_items"], 0);
        assert_eq!(res.body["pagination"]["total_pages"], 0);
    }

    #[tokio::test]
    async fn pages_are_newest_first() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        for n in 1..=3 {
            app.create_achievement(&student.token, &format!("Entry {n}"), n).await;
        }

        let first = app
            .get_with_token(
                &format!("{}?page=1&page_size=2", routes::ACHIEVEMENTS),
                &student.token,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["pagination"]["total_items"], 3);
        assert_eq!(first.body["pagination"]["total_pages"], 2);
        let titles: Vec<&str> = first.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["content"]["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Entry 3", "Entry 2"]);

        let second = app
            .get_with_token(
                &format!("{}?page=2&page_size=2", routes::ACHIEVEMENTS),
                &student.token,
            )
            .await;
        let data = second.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["content"]["title"], "Entry 1");
    }

    #[tokio::test]
    async fn page_size_is_clamped() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .get_with_token(
                &format!("{}?page=0&page_size=5000", routes::ACHIEVEMENTS),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["page"], 1);
        assert_eq!(res.body["pagination"]["page_size"], 100);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "alice", None).await;
        app.create_achievement(&student.token, "Draft", 5).await;
        let submitted = app.create_submitted(&student.token, "Submitted").await;

        let res = app
            .get_with_token(
                &format!("{}?status=submitted", routes::ACHIEVEMENTS),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], submitted);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .get_with_token(&format!("{}?status=archived", routes::ACHIEVEMENTS), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
