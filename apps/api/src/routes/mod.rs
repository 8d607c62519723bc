pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluations::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/grades", get(handlers::handle_grades))
        .route("/api/v1/levels", get(handlers::handle_level))
        // Evaluation API
        .route(
            "/api/v1/evaluations/generate",
            post(handlers::handle_generate),
        )
        .route(
            "/api/v1/evaluations/regenerate",
            post(handlers::handle_regenerate),
        )
        .route("/api/v1/evaluations/update", post(handlers::handle_update))
        // PD drafting
        .route("/api/v1/pd/draft", post(handlers::handle_pd_draft))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::evaluations::pipeline::tests::{test_state, FES_1200_PROPOSAL};
    use crate::llm_client::scripted::ScriptedCompletion;

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(router, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_grades_defaults_to_fes() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(router, get_request("/api/v1/grades")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ratingSystem"], "FES");
        assert_eq!(body["bands"].as_array().unwrap().len(), 8);
        assert_eq!(body["bands"][1]["grade"], "GS-07");
        assert_eq!(body["bands"][1]["minPoints"], 1355);
        assert_eq!(body["bands"][7]["maxPoints"], Value::Null);
    }

    #[tokio::test]
    async fn test_grades_for_gssg() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(router, get_request("/api/v1/grades?ratingSystem=GSSG")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ratingSystem"], "GSSG");
    }

    #[tokio::test]
    async fn test_level_stepper_keeps_letter_notation() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(
            router,
            get_request("/api/v1/levels?factor=7&level=7-B"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 50);
        assert_eq!(body["nextHigher"], "7-C");
        assert_eq!(body["nextLower"], "7-A");
    }

    #[tokio::test]
    async fn test_level_stepper_at_ceiling_and_bad_level() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (_, body) = send(
            router.clone(),
            get_request("/api/v1/levels?ratingSystem=GSSG&factor=4A&level=4A-4"),
        )
        .await;
        assert_eq!(body["points"], 100);
        assert_eq!(body["nextHigher"], Value::Null);

        let (status, body) = send(router, get_request("/api/v1/levels?factor=1&level=1-99")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 0);
    }

    #[tokio::test]
    async fn test_level_stepper_rejects_foreign_factor() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(
            router,
            get_request("/api/v1/levels?ratingSystem=GSSG&factor=9&level=9-1"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_returns_output_contract() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::new([
            FES_1200_PROPOSAL,
        ]))));
        let (status, body) = send(
            router,
            post_json(
                "/api/v1/evaluations/generate",
                json!({"dutiesText": "Processes grant applications.", "targetGrade": "GS-07"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPoints"], 1450);
        assert_eq!(body["finalGrade"], "GS-07");
        assert_eq!(body["gradeRange"], "1355-1600");
        assert_eq!(body["ratingSystem"], "FES");
        assert_eq!(body["factors"]["Factor 1"]["level"], "1-6");
        assert_eq!(body["factors"]["Factor 1"]["points"], 950);
        assert_eq!(
            body["factors"]["Factor 1"]["header"],
            "Factor 1 - Knowledge Required by the Position Level 1-6, 950 Points"
        );
        assert_eq!(body["adjustments"]["moves"][0]["factor"], "1");
        assert!(body.get("forcedFrom").is_none());
        assert!(body["evaluationId"].is_string());
        assert!(body["generatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_generate_validation_error_body() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(
            router,
            post_json(
                "/api/v1/evaluations/generate",
                json!({"dutiesText": "", "targetGrade": "GS-07"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_llm_failure_is_bad_gateway() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::failing(529))));
        let (status, body) = send(
            router,
            post_json(
                "/api/v1/evaluations/generate",
                json!({"dutiesText": "Processes grants.", "targetGrade": "GS-07"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_update_reports_forced_total() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::default())));
        let (status, body) = send(
            router,
            post_json(
                "/api/v1/evaluations/update",
                json!({
                    "targetGrade": "GS-05",
                    "ratingSystem": "GSSG",
                    "existingFactors": {
                        "1": {"level": "1-1"}, "2": {"level": "2-1"}, "3": {"level": "3-1"},
                        "4A": {"level": "4A-1"}, "4B": {"level": "4B-1"},
                        "5": {"level": "5-1"}, "6": {"level": "6-1"}
                    }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["forcedFrom"], 1165);
        assert_eq!(body["totalPoints"], 1355);
        assert_eq!(body["finalGrade"], "GS-07");
        assert_eq!(body["adjustments"]["forcedFrom"], 1165);
    }

    #[tokio::test]
    async fn test_pd_draft_returns_evaluation_and_draft() {
        let router = build_router(test_state(Arc::new(ScriptedCompletion::new([
            FES_1200_PROPOSAL,
            "INTRODUCTION\nGrant processing.",
        ]))));
        let (status, body) = send(
            router,
            post_json(
                "/api/v1/pd/draft",
                json!({"dutiesText": "Processes grants.", "targetGrade": "GS-07"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["evaluation"]["finalGrade"], "GS-07");
        let draft = body["draft"].as_str().unwrap();
        assert!(draft.contains("FACTOR EVALUATION"));
        assert!(draft.contains("Total Points: 1450"));
    }
}
