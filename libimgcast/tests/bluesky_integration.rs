//! Bluesky client against a stub PDS

mod common;

use common::{small_packed_image, StubServer};
use libimgcast::config::BlueskyConfig;
use libimgcast::credentials::{BlueskyCredentials, CredentialStore};
use libimgcast::error::PlatformError;
use libimgcast::platforms::bluesky::BlueskyClient;
use libimgcast::ImgcastError;

const SESSION: &str = r#"{"accessJwt":"jwt-123","refreshJwt":"refresh-456","did":"did:plc:alice","handle":"alice.bsky.social"}"#;
const BLOB: &str = r#"{"blob":{"$type":"blob","ref":{"$link":"bafkreibme22gw2h7y2h7tg2fhqotaqjucnbc24deqo72b6mkl2egezxhvy"},"mimeType":"image/jpeg","size":321}}"#;
const RECORD: &str = r#"{"uri":"at://did:plc:alice/app.bsky.feed.post/3kabc","cid":"bafyreie5737gdxlw5i64vzichcalba3z2v5n6icifvx5xytvske7mr3hpm"}"#;

async fn client_for(server: &StubServer) -> BlueskyClient {
    let config = BlueskyConfig {
        pds_url: server.base_url.clone(),
        ..Default::default()
    };
    BlueskyClient::new(&config).await.unwrap()
}

fn credentials() -> BlueskyCredentials {
    let store = CredentialStore::from_pairs([
        ("BLUESKY_USERNAME", "alice.bsky.social"),
        ("BLUESKY_PASSWORD", "app-pass-word"),
    ]);
    BlueskyCredentials::from_store(&store).unwrap()
}

#[tokio::test]
async fn test_login_upload_and_post() {
    let server = StubServer::start(vec![(200, SESSION), (200, BLOB), (200, BLOB), (200, RECORD)]).await;
    let mut client = client_for(&server).await;
    let first = small_packed_image();
    let second = small_packed_image();

    client.login(&credentials()).await.unwrap();
    assert!(client.is_authenticated());

    let post = client
        .send_images("Compressing images?", &[&first, &second])
        .await
        .unwrap();

    assert_eq!(post.uri, "at://did:plc:alice/app.bsky.feed.post/3kabc");
    assert_eq!(
        post.cid,
        "bafyreie5737gdxlw5i64vzichcalba3z2v5n6icifvx5xytvske7mr3hpm"
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 4);

    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/xrpc/com.atproto.server.createSession");
    let login = requests[0].body_json();
    assert_eq!(login["identifier"], "alice.bsky.social");
    assert_eq!(login["password"], "app-pass-word");

    assert_eq!(requests[1].path, "/xrpc/com.atproto.repo.uploadBlob");
    assert_eq!(requests[1].header("authorization"), Some("Bearer jwt-123"));
    assert_eq!(requests[1].body, first.bytes());

    assert_eq!(requests[3].path, "/xrpc/com.atproto.repo.createRecord");
    let create = requests[3].body_json();
    assert_eq!(create["repo"], "did:plc:alice");
    assert_eq!(create["collection"], "app.bsky.feed.post");
    assert_eq!(create["record"]["text"], "Compressing images?");
    assert_eq!(create["record"]["$type"], "app.bsky.feed.post");
    assert!(create["record"]["createdAt"].is_string());

    let embed = &create["record"]["embed"];
    assert_eq!(embed["$type"], "app.bsky.embed.images");
    let images = embed["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["alt"], "");
    assert_eq!(
        images[0]["image"]["ref"]["$link"],
        "bafkreibme22gw2h7y2h7tg2fhqotaqjucnbc24deqo72b6mkl2egezxhvy"
    );
    assert_eq!(images[0]["aspectRatio"]["width"], 12);
    assert_eq!(images[0]["aspectRatio"]["height"], 8);
}

#[tokio::test]
async fn test_login_rejected() {
    let server = StubServer::start(vec![(
        401,
        r#"{"error":"AuthenticationRequired","message":"Invalid identifier or password"}"#,
    )])
    .await;
    let mut client = client_for(&server).await;

    let err = client.login(&credentials()).await.unwrap_err();

    match &err {
        ImgcastError::Platform(PlatformError::Authentication(msg)) => {
            assert!(msg.contains("Invalid identifier or password"));
        }
        other => panic!("Expected authentication error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_failed_blob_upload_aborts_post() {
    let server = StubServer::start(vec![
        (200, SESSION),
        (200, BLOB),
        (500, r#"{"error":"InternalServerError"}"#),
        (200, RECORD),
    ])
    .await;
    let mut client = client_for(&server).await;
    let image = small_packed_image();

    client.login(&credentials()).await.unwrap();
    let err = client.send_images("Hello", &[&image, &image]).await.unwrap_err();

    assert!(matches!(
        err,
        ImgcastError::Platform(PlatformError::Posting(_))
    ));
    assert!(err.to_string().contains("InternalServerError"));
    assert_eq!(server.requests().len(), 3);
}

#[tokio::test]
async fn test_caption_validated_before_upload() {
    let server = StubServer::start(vec![(200, SESSION)]).await;
    let mut client = client_for(&server).await;
    let image = small_packed_image();

    client.login(&credentials()).await.unwrap();
    let err = client
        .send_images(&"x".repeat(301), &[&image])
        .await
        .unwrap_err();

    assert!(matches!(err, ImgcastError::InvalidInput(_)));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_unreachable_pds_is_network_error() {
    let server = StubServer::start(vec![]).await;
    let mut client = client_for(&server).await;
    // Give the stub task a moment to finish and drop its listener.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = client.login(&credentials()).await.unwrap_err();
    assert!(matches!(
        err,
        ImgcastError::Platform(PlatformError::Network(_))
    ));
}
