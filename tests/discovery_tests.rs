use pretty_assertions::assert_eq;
use serde_json::json;
use voxel_relay::{
    Error,
    config::TransportConfig,
    directory::discover,
    transport::HttpTransport,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

mod common;
use common::{MemoryVolumeStore, ScriptedConsent, TestHost, create_temp_dir, create_test_config, service_entry};

fn transport() -> HttpTransport {
    HttpTransport::new(&TransportConfig {
        timeout_secs: 5,
        chunk_size: 1024,
    })
    .unwrap()
}

#[tokio::test]
async fn test_every_entry_lands_in_its_own_leaf() {
    let server = MockServer::start().await;
    let base = server.uri();
    let entries = vec![
        service_entry(&base, "ct-liver-1", "CT", "Liver", "3D"),
        service_entry(&base, "mr-prostate", "MR", "Prostate", "3D"),
        service_entry(&base, "ct-liver-2", "CT", "Liver", "3D"),
        service_entry(&base, "ct-liver-2d", "CT", "Liver", "2D"),
        service_entry(&base, "ct-lung", "CT", "Lung", "3D"),
    ];
    Mock::given(method("GET"))
        .and(path("/discover"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(entries)))
        .mount(&server)
        .await;

    let catalog = discover(&transport(), &format!("{}/discover", base))
        .await
        .unwrap();

    assert_eq!(catalog.len(), 5);
    for service in catalog.services() {
        let leaf = catalog.get(&service.modality, &service.anatomy, &service.dimensionality);
        assert!(leaf.iter().any(|s| s.sid == service.sid));
    }
    let liver: Vec<_> = catalog
        .get("CT", "Liver", "3D")
        .iter()
        .map(|s| s.sid.as_str())
        .collect();
    assert_eq!(liver, vec!["ct-liver-1", "ct-liver-2"]);
}

#[tokio::test]
async fn test_entry_missing_modality_admits_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();
    let mut broken = service_entry(&base, "broken", "CT", "Liver", "3D");
    broken.as_object_mut().unwrap().remove("modality");
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            service_entry(&base, "ok", "CT", "Liver", "3D"),
            broken,
        ])))
        .mount(&server)
        .await;

    let result = discover(&transport(), &server.uri()).await;

    assert!(matches!(result, Err(Error::Schema(_))));
}

#[tokio::test]
async fn test_unreachable_directory_is_network_error() {
    let result = discover(&transport(), "http://127.0.0.1:9/discover").await;
    assert!(matches!(result, Err(Error::Network(_))));
}

#[test_log::test(tokio::test)]
async fn test_session_catalog_is_empty_after_failed_rediscovery() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/discover"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([service_entry(&base, "liver", "CT", "Liver", "3D")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discover"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let config = create_test_config(dir.path(), &format!("{}/discover", base));
    let host = TestHost::new(MemoryVolumeStore::new(), ScriptedConsent::default());
    let mut session = host.session(&config, None);

    assert_eq!(session.discover().await.unwrap().len(), 1);

    let second = session.discover().await;
    assert!(matches!(second, Err(Error::Network(_))));
    assert!(session.catalog().is_empty());
}

#[tokio::test]
async fn test_rendered_tree_lists_categories_and_services() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            service_entry(&base, "liver", "CT", "Liver", "3D"),
        ])))
        .mount(&server)
        .await;

    let catalog = discover(&transport(), &server.uri()).await.unwrap();

    assert_eq!(
        catalog.render(),
        "Modality: CT\n  Anatomy: Liver\n    Dimensionality: 3D\n      Service: Liver segmentation. Sid:liver\n"
    );
}
