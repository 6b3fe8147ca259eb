use bytes::Bytes;

use keep_core::{ErrorKind, KeepConfig, RequestContext};
use keep_records::{DocumentType, NewUser, RecordsApp, RecordsConfig};

#[tokio::test]
async fn in_memory_app_wires_both_services() {
    let app = RecordsApp::in_memory("keep-docs");
    let ctx = RequestContext::new().with_actor("admin");

    let user = app
        .users
        .create(
            &ctx,
            NewUser {
                email: "grace@example.com".to_string(),
                firebase_id: "fb-grace".to_string(),
                ..NewUser::default()
            },
        )
        .await
        .unwrap();

    let png = Bytes::from_static(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x01]);
    let doc = app
        .documents
        .create(&ctx, &user.id, DocumentType::DriverLicence, png)
        .await
        .unwrap();

    assert_eq!(doc.bucket, "keep-docs");
    let owned = app.documents.list_by_owner(&ctx, &user.id).await.unwrap();
    assert_eq!(owned.items, vec![doc]);

    let listed = app
        .documents
        .blobs()
        .list(&ctx, &format!("documents/{}/", user.id))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].bucket, "keep-docs");

    assert!(app.mongo().is_none());
    app.shutdown().await;
}

#[tokio::test]
async fn connect_reports_a_bad_mongo_uri_as_unavailable() {
    let mut config = KeepConfig::new();
    config.set("blob.bucket", "keep-docs");
    config.set("mongo.uri", "not-a-mongo-uri");
    let config = RecordsConfig::from_config(&config).unwrap();

    let err = match RecordsApp::connect(&config).await {
        Ok(_) => panic!("connected with a malformed URI"),
        Err(err) => err,
    };
    assert_eq!(err.kind, ErrorKind::Unavailable);
}

#[test]
fn config_without_a_bucket_is_rejected() {
    let err = RecordsConfig::from_config(&KeepConfig::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}
