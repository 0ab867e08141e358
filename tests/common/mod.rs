//! Common test utilities and helpers
//!
//! `FakeSeldon` is an in-process HTTP server that answers the v1.0
//! prediction and feedback routes of one deployment and records every body
//! it receives.

#![allow(dead_code)]

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use reward_probe_core::{EndpointConfig, GatewayMode, StopHandle};
use serde_json::{json, Value};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

pub const NAMESPACE: &str = "default";
pub const DEPLOYMENT: &str = "wines-classifier";

/// How the fake endpoint answers prediction requests
#[derive(Debug, Clone)]
pub enum Responder {
    /// Tensor response holding one value
    Constant(f64),
    /// Tensor response echoing the first feature of the request
    EchoFirstFeature,
    /// Arbitrary JSON body with status 200
    Raw(Value),
    /// Error status with a text body
    Status(u16, String),
}

#[derive(Default)]
struct Recorded {
    predictions: Vec<Value>,
    feedback: Vec<Value>,
}

#[derive(Clone)]
struct FakeState {
    responder: Responder,
    recorded: Arc<Mutex<Recorded>>,
    /// Trip this stop handle once this many feedback calls arrived
    stop_after: Option<(usize, StopHandle)>,
}

/// Running fake Seldon deployment
pub struct FakeSeldon {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeSeldon {
    /// Start a fake deployment behind the Istio-style route prefix
    pub async fn start(responder: Responder) -> Self {
        Self::start_with_stop(responder, None).await
    }

    /// Start a fake deployment that stops a driver after `n` feedback calls
    pub async fn start_with_stop(
        responder: Responder,
        stop_after: Option<(usize, StopHandle)>,
    ) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = FakeState {
            responder,
            recorded: recorded.clone(),
            stop_after,
        };

        let prefix = format!("/seldon/{}/{}/api/v1.0", NAMESPACE, DEPLOYMENT);
        let router = Router::new()
            .route(&format!("{}/predictions", prefix), post(predictions_handler))
            .route(&format!("{}/feedback", prefix), post(feedback_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Seldon listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fake Seldon server failed");
        });

        Self { addr, recorded }
    }

    /// Endpoint configuration pointing at this server
    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            gateway: GatewayMode::Istio,
            namespace: NAMESPACE.to_string(),
            gateway_endpoint: self.addr.to_string(),
            deployment_name: DEPLOYMENT.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn predictions(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().predictions.clone()
    }

    pub fn feedback(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().feedback.clone()
    }
}

fn tensor_response(value: f64) -> Value {
    json!({
        "meta": {"puid": "fake-puid", "tags": {}, "routing": {}, "requestPath": {}},
        "data": {
            "names": ["t:0"],
            "tensor": {"shape": [1, 1], "values": [value]}
        }
    })
}

async fn predictions_handler(
    State(state): State<FakeState>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let first_feature = body["data"]["tensor"]["values"][0].as_f64().unwrap_or(f64::NAN);
    state.recorded.lock().unwrap().predictions.push(body);

    match &state.responder {
        Responder::Constant(value) => (StatusCode::OK, tensor_response(*value).to_string()),
        Responder::EchoFirstFeature => (StatusCode::OK, tensor_response(first_feature).to_string()),
        Responder::Raw(value) => (StatusCode::OK, value.to_string()),
        Responder::Status(code, text) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            text.clone(),
        ),
    }
}

async fn feedback_handler(State(state): State<FakeState>, Json(body): Json<Value>) -> Json<Value> {
    let count = {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.feedback.push(body);
        recorded.feedback.len()
    };

    if let Some((n, stop)) = &state.stop_after {
        if count >= *n {
            stop.stop();
        }
    }

    Json(json!({"meta": {}, "data": {"ndarray": []}}))
}

/// Write a dataset to a temporary file
pub fn write_dataset(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp dataset");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp dataset");
    file.flush().expect("Failed to flush temp dataset");
    file
}
