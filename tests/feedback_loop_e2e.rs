//! End-to-end feedback loop: dataset file → driver → HTTP → fake deployment

mod common;

use common::{write_dataset, FakeSeldon, Responder};
use reward_probe_core::{Dataset, FeedbackDriver, ProbeError, SeldonClient, StopHandle};
use serde_json::json;
use std::sync::Arc;

const IRIS_ROW: &str = "sepal,petal,label\n5.1,1.4,3\n";

async fn driver_for(server: &FakeSeldon, csv: &str) -> FeedbackDriver {
    let file = write_dataset(csv);
    let dataset = Dataset::from_path(file.path(), b',').unwrap();
    let client = SeldonClient::new(&server.endpoint_config()).unwrap();
    FeedbackDriver::new(Arc::new(client), Arc::new(dataset))
}

#[tokio::test]
async fn test_exact_prediction_reports_500() {
    let server = FakeSeldon::start(Responder::Constant(3.0)).await;
    let driver = driver_for(&server, IRIS_ROW).await;

    let record = driver.dataset().records()[0].clone();
    let reward = driver.process_record(&record).await.unwrap();

    assert_eq!(reward, 500.0);
    assert_eq!(server.feedback()[0]["reward"], json!(500.0));
}

#[tokio::test]
async fn test_off_by_two_reports_quarter() {
    let server = FakeSeldon::start(Responder::Constant(1.0)).await;
    let driver = driver_for(&server, IRIS_ROW).await;

    let record = driver.dataset().records()[0].clone();
    let reward = driver.process_record(&record).await.unwrap();

    assert_eq!(reward, 0.25);
    assert_eq!(server.feedback()[0]["reward"], json!(0.25));
    assert_eq!(
        server.predictions()[0]["data"],
        json!({
            "names": ["sepal", "petal"],
            "tensor": {"shape": [1, 2], "values": [5.1, 1.4]}
        })
    );
}

#[tokio::test]
async fn test_one_pass_pairs_every_record() {
    let csv = "a,b,label\n1,10,1\n2,20,5\n3,30,3\n4,40,0\n";
    let server = FakeSeldon::start(Responder::EchoFirstFeature).await;
    let driver = driver_for(&server, csv).await;

    let report = driver.run_pass().await.unwrap();

    assert_eq!(report.records, 4);
    assert_eq!(report.exact_matches, 2);

    let predictions = server.predictions();
    let feedback = server.feedback();
    assert_eq!(predictions.len(), 4);
    assert_eq!(feedback.len(), 4);

    for (request, fb) in predictions.iter().zip(&feedback) {
        assert_eq!(&fb["request"], request);
    }

    let rewards: Vec<f64> = feedback.iter().map(|f| f["reward"].as_f64().unwrap()).collect();
    assert_eq!(rewards, vec![500.0, 1.0 / 9.0, 500.0, 1.0 / 16.0]);
}

#[tokio::test]
async fn test_run_stops_between_passes() {
    let csv = "a,label\n1,1\n2,2\n3,3\n";
    let file = write_dataset(csv);
    let dataset = Arc::new(Dataset::from_path(file.path(), b',').unwrap());

    // Stop is requested at the second feedback call, mid-pass
    let stop = StopHandle::new();
    let server =
        FakeSeldon::start_with_stop(Responder::EchoFirstFeature, Some((2, stop.clone()))).await;
    let client = SeldonClient::new(&server.endpoint_config()).unwrap();
    let driver = FeedbackDriver::new(Arc::new(client), dataset).with_stop_handle(stop);

    let passes = driver.run().await.unwrap();

    assert_eq!(passes, 1);
    assert_eq!(server.predictions().len(), 3);
    assert_eq!(server.feedback().len(), 3);
    assert!(!driver.is_running());
}

#[tokio::test]
async fn test_endpoint_failure_halts_run() {
    let csv = "a,label\n1,1\n2,2\n";
    let server = FakeSeldon::start(Responder::Status(500, "model crashed".to_string())).await;
    let driver = driver_for(&server, csv).await;

    let err = driver.run().await.unwrap_err();

    assert!(matches!(err, ProbeError::Endpoint { status: 500, .. }));
    assert_eq!(server.predictions().len(), 1);
    assert!(server.feedback().is_empty());
}

#[tokio::test]
async fn test_missing_tensor_halts_without_feedback() {
    let server = FakeSeldon::start(Responder::Raw(json!({"data": {"ndarray": [[3]]}}))).await;
    let driver = driver_for(&server, IRIS_ROW).await;

    let err = driver.run_pass().await.unwrap_err();

    assert!(matches!(err, ProbeError::MalformedResponse(_)));
    assert!(server.feedback().is_empty());
}
