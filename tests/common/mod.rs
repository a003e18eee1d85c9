//! Shared helpers for the application integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use reelforge::config::Config;
use reelforge::server::{create_router, AppContext};
use reelforge_workflow::{
    AgentResult, AgentSet, CameraAgent, CameraInstruction, Orchestrator, StoryboardShot,
    TaskContext, TaskRegistry,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Camera agent that always reports a service failure.
pub struct FailingCamera;

impl CameraAgent for FailingCamera {
    fn run(
        &self,
        _context: &TaskContext,
        _storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<CameraInstruction>> {
        anyhow::bail!("camera service unavailable")
    }
}

pub fn failing_camera_agents() -> AgentSet {
    AgentSet::deterministic().with_camera(Arc::new(FailingCamera))
}

/// Router over a fresh registry built from `agents`.
pub fn test_router(agents: AgentSet) -> (Router, Arc<TaskRegistry>) {
    test_router_with_config(agents, Config::default())
}

pub fn test_router_with_config(agents: AgentSet, config: Config) -> (Router, Arc<TaskRegistry>) {
    let registry = Arc::new(TaskRegistry::new(Orchestrator::new(agents)));
    let ctx = AppContext::new(registry.clone(), config);
    (create_router(ctx, None), registry)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request and decode the JSON body (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
