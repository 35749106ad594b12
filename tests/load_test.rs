//! Concurrent requests through one gateway stay independent.

use std::time::{Duration, Instant};

use axum::http::StatusCode;

mod common;

use common::{client, gateway_config, Gateway, RecordingBackend, API_KEY};

#[tokio::test]
async fn test_concurrent_requests() {
    let body: Vec<u8> = (0..10_000u32).map(|i| (i % 97) as u8).collect();
    let backend = RecordingBackend::start(StatusCode::OK, Some("application/octet-stream"), body.clone()).await;
    let gateway = Gateway::start(gateway_config(&backend.url())).await;

    let concurrency = 20;
    let requests_per_task = 10;
    let client = client();
    let start = Instant::now();

    let mut handles = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let url = gateway.url(&format!("/api/embed/{}", task));
        let expected = body.clone();
        // Every fifth task sends a bad key; those must not disturb the rest.
        let auth = if task % 5 == 0 {
            "Bearer nope".to_string()
        } else {
            format!("Bearer {}", API_KEY)
        };
        handles.push(tokio::spawn(async move {
            let mut ok = 0usize;
            for _ in 0..requests_per_task {
                let res = client.get(&url).header("Authorization", &auth).send().await.unwrap();
                if res.status() == 200 {
                    assert_eq!(res.bytes().await.unwrap().as_ref(), expected.as_slice());
                    ok += 1;
                } else {
                    assert_eq!(res.status(), 401);
                }
            }
            ok
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        admitted += handle.await.unwrap();
    }

    let rejected_tasks = (0..concurrency).filter(|t| t % 5 == 0).count();
    let expected_admitted = (concurrency - rejected_tasks) * requests_per_task;
    assert_eq!(admitted, expected_admitted);
    assert_eq!(backend.hits(), expected_admitted);
    assert!(start.elapsed() < Duration::from_secs(30));
}
