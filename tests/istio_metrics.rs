//! End-to-end tests of the Istio query strategies against a mock Prometheus

use prom_query::{
    ClientConfig, IstioProfile, IstioQuery, IstioQueryConfig, MetricQuery, MetricRestClient,
    QueryFamily,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vector(result: serde_json::Value) -> serde_json::Value {
    json!({
        "status": "success",
        "data": {"resultType": "vector", "result": result}
    })
}

async fn mount_family(server: &MockServer, family: QueryFamily, result: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", family.expression("istio_").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(result)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_all_query_types_map_to_entities() {
    let server = MockServer::start().await;

    let pod_samples = json!([
        {"metric": {"destination_uid": "kubernetes://video-671194421-vpxkh.default"}, "value": [1700000000.0, "12.5"]},
        {"metric": {"destination_uid": "kubernetes://inception-be-41ldc.istio-system"}, "value": [1700000000.0, "3"]}
    ]);
    let svc_samples = json!([
        {"metric": {"destination_uid": "productpage.default.svc.cluster.local"}, "value": [1700000000.0, "8"]}
    ]);

    mount_family(&server, QueryFamily::PodRequestRate, pod_samples.clone()).await;
    mount_family(&server, QueryFamily::PodLatency, pod_samples).await;
    mount_family(&server, QueryFamily::ServiceRequestRate, svc_samples.clone()).await;
    mount_family(&server, QueryFamily::ServiceLatency, svc_samples).await;

    let client = MetricRestClient::new(ClientConfig::new(server.uri())).unwrap();
    let mut query = IstioQuery::default();

    let mut entities = Vec::new();
    for qtype in 0..query.query_type_count() {
        query.set_query_type(qtype).unwrap();
        let records = client.get_metrics(&query).await.unwrap();
        for record in records {
            entities.push((qtype, record.entity_id().unwrap(), record.value()));
        }
    }

    assert_eq!(
        entities,
        vec![
            (0, "default/video-671194421-vpxkh".to_string(), 12.5),
            (0, "istio-system/inception-be-41ldc".to_string(), 3.0),
            (1, "default/video-671194421-vpxkh".to_string(), 12.5),
            (1, "istio-system/inception-be-41ldc".to_string(), 3.0),
            (2, "default/productpage".to_string(), 8.0),
            (3, "default/productpage".to_string(), 8.0),
        ]
    );
}

#[tokio::test]
async fn test_bad_samples_are_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(json!([
            {"metric": {"destination_service": "reviews.bookinfo.svc.cluster.local"}, "value": [1700000000.0, "NaN"]},
            {"metric": {"source_service": "ratings.bookinfo.svc.cluster.local"}, "value": [1700000000.0, "1"]},
            {"metric": {"destination_service": "details.bookinfo.svc.cluster.local"}, "value": [1700000000.0, "0.75"]}
        ]))))
        .mount(&server)
        .await;

    let client = MetricRestClient::new(ClientConfig::new(server.uri())).unwrap();
    let query = IstioQuery::new(IstioQueryConfig {
        profile: IstioProfile::ServiceOnly,
        ..Default::default()
    });

    let records = client.get_metrics(&query).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity_id().unwrap(), "bookinfo/details");
    assert_eq!(records[0].to_string(), "uid=bookinfo/details, value=0.75000");
}

#[tokio::test]
async fn test_server_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "error": "bad query"
        })))
        .mount(&server)
        .await;

    let client = MetricRestClient::new(ClientConfig::new(server.uri())).unwrap();
    let err = client.get_metrics(&IstioQuery::default()).await.unwrap_err();
    assert_eq!(err.server_message(), Some("bad query"));
}
