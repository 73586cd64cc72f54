use std::fs;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use mobile_price::models::ForestParams;
use mobile_price::{
    api, FeatureEngineer, PredictionService, RawSpecRecord, SpecField, TrainingConfig,
    TrainingError, TrainingPipeline,
};

const HEADER: &str = "Company Name,Model Name,Mobile Weight,RAM,Front Camera,Back Camera,Processor,Launched Price (Pakistan),Launched Price (India),Launched Price (USA),Launched Price (China),Launched Price (Dubai),Battery Capacity,Screen Size,Launched Year";

const PROCESSORS: [&str; 5] = [
    "A16 Bionic",
    "Snapdragon 8 Gen 2",
    "Exynos 1380",
    "MediaTek Dimensity 9200",
    "Unisoc T612",
];

fn dataset() -> String {
    let mut text = format!("{HEADER}\n");
    for i in 0..40u32 {
        let processor = PROCESSORS[(i % 5) as usize];
        let price = 12_999 + i * 2_500 + (i % 5) * 7_000;
        text.push_str(&format!(
            "Brand{i},Model {i},{}g,{}GB,{}MP,{}MP,{processor},\"PKR 99,999\",\"INR {},{:03}\",USD 499,CNY 3999,AED 1999,\"{},{:03}mAh\",{} inches,{}\n",
            160 + i * 2,
            4 + (i % 4) * 2,
            8 + (i % 3) * 8,
            48 + (i % 2) * 2,
            price / 1000,
            price % 1000,
            4 + i % 2,
            (i * 37) % 1000,
            6.1 + f64::from(i % 6) * 0.1,
            2019 + i % 6,
        ));
    }
    // строки, которые должны быть исключены
    text.push_str("Brand,Broken,heavy,8GB,12MP,48MP,A15 Bionic,,\"INR 50,000\",,,,4000mAh,6.1 inches,2022\n");
    text.push_str("Brand,NoPrice,180g,8GB,12MP,48MP,A15 Bionic,,Not announced,,,,4000mAh,6.1 inches,2022\n");
    text
}

fn request() -> serde_json::Value {
    serde_json::json!({
        "Mobile Weight": 188,
        "RAM": 8,
        "Front Camera": 16,
        "Back Camera": 50,
        "Processor": "Snapdragon 8 Gen 2",
        "Battery Capacity": 5000,
        "Screen Size": 6.7,
        "Launched Year": 2024
    })
}

#[tokio::test]
async fn train_then_serve() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("Mobiles Dataset (2025).csv");
    fs::write(&dataset_path, dataset()).unwrap();
    let artifacts_dir = dir.path().join("artifacts");

    let config = TrainingConfig {
        dataset_path,
        artifacts_dir: artifacts_dir.clone(),
        forest: ForestParams {
            n_trees: 30,
            ..ForestParams::default()
        },
        ..TrainingConfig::default()
    };
    let report = TrainingPipeline::new(config).run().unwrap();
    assert_eq!(report.rows_total, 42);
    assert_eq!(report.rows_used, 40);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.processor_fallbacks, 8);
    assert!(report.evaluation.is_some());

    let service = Arc::new(PredictionService::load(&artifacts_dir));
    assert!(service.is_ready());

    let record: RawSpecRecord = serde_json::from_value(request()).unwrap();
    let features = FeatureEngineer::to_feature_vector(&record).unwrap();
    assert_eq!(
        features.as_slice(),
        &[188.0, 8.0, 16.0, 50.0, 3.2, 5000.0, 6.7, 2024.0]
    );
    assert_eq!(features.get(SpecField::Processor), 3.2);

    let expected = service.predict(&record).unwrap();
    assert!(expected.is_finite() && expected >= 0.0);

    let response = api::router(service)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from(request().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["prediction"].as_f64(), Some(expected));
}

#[test]
fn retraining_overwrites_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("mobiles.csv");
    fs::write(&dataset_path, dataset()).unwrap();

    let config = |seed| TrainingConfig {
        dataset_path: dataset_path.clone(),
        artifacts_dir: dir.path().join("artifacts"),
        forest: ForestParams {
            n_trees: 5,
            seed,
            ..ForestParams::default()
        },
        holdout_fraction: 0.0,
        ..TrainingConfig::default()
    };

    TrainingPipeline::new(config(1)).run().unwrap();
    let first = PredictionService::load(&dir.path().join("artifacts"));
    TrainingPipeline::new(config(2)).run().unwrap();
    let second = PredictionService::load(&dir.path().join("artifacts"));

    match (first, second) {
        (PredictionService::Ready(a), PredictionService::Ready(b)) => {
            assert_eq!(a.model.params().seed, 1);
            assert_eq!(b.model.params().seed, 2);
        }
        _ => panic!("both runs should produce loadable artifacts"),
    }
}

#[test]
fn empty_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("empty.csv");
    fs::write(&dataset_path, format!("{HEADER}\n")).unwrap();

    let config = TrainingConfig {
        dataset_path,
        artifacts_dir: dir.path().join("artifacts"),
        ..TrainingConfig::default()
    };
    let err = TrainingPipeline::new(config).run().unwrap_err();
    assert!(matches!(err, TrainingError::Dataset(_)));
    assert!(!PredictionService::load(&dir.path().join("artifacts")).is_ready());
}
