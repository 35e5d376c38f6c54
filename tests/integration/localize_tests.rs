//! End-to-end localization tests
//!
//! Each test serves resources from a wiremock server, localizes a card that
//! references them, and inspects the rewritten card and the output directory.

use crate::common::{build_card, test_options};
use card_localizer::card::decode_card;
use card_localizer::config::Config;
use card_localizer::output::NullSink;
use card_localizer::{
    localize_card, localize_card_file, CardFileOutcome, LocalizerError, PipelineError, Severity,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_body(server: &MockServer, route: &str, body: &[u8], hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_failure_isolation() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_body(&server, "/b.png", b"PNGDATA-B", 1).await;

    let dir = TempDir::new().unwrap();
    let document = json!({
        "name": "Ann",
        "data": {
            "avatar": format!("{}/a.png", base),
            "first_mes": format!("<img src=\"{}/b.png\">", base),
        },
    });

    let card = localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(card.stats.discovered, 2);
    assert_eq!(card.stats.downloaded, 1);
    assert_eq!(card.stats.failed, 1);
    assert_eq!(card.stats.failed_urls, vec![format!("{}/a.png", base)]);

    // B substituted, A left verbatim
    let rewritten = decode_card(&card.bytes).unwrap();
    assert_eq!(rewritten["data"]["avatar"], format!("{}/a.png", base));
    assert_eq!(
        rewritten["data"]["first_mes"],
        "<img src=\"/niko/Ann/images/b.png\">"
    );
    assert_eq!(rewritten["data"], card.document["data"]);

    let stored = dir.path().join("niko").join("Ann").join("images").join("b.png");
    assert_eq!(std::fs::read(stored).unwrap(), b"PNGDATA-B");
    assert!(!dir.path().join("niko/Ann/images/a.png").exists());

    assert!(card.log.contains("[SUCCESS]"));
    assert!(card.log.contains("[FAILURE]"));
    assert!(card.log.contains("Completed with failures: 1 succeeded, 1 failed"));
}

#[tokio::test]
async fn test_duplicate_references_fetched_once() {
    let server = MockServer::start().await;
    let url = format!("{}/same.gif", server.uri());
    mount_body(&server, "/same.gif", b"GIF89a", 1).await;

    let dir = TempDir::new().unwrap();
    let document = json!({
        "name": "Ann",
        "avatar": url,
        "data": {
            "first_mes": format!("{} and again {}", url, url),
            "alternate_greetings": [url.clone(), url.clone()],
        },
    });

    let card = localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(card.stats.discovered, 1);
    assert_eq!(card.stats.downloaded, 1);
    assert_eq!(
        card.document["data"]["first_mes"],
        "/niko/Ann/images/same.gif and again /niko/Ann/images/same.gif"
    );

    server.verify().await;
}

#[tokio::test]
async fn test_rerun_makes_no_requests() {
    let server = MockServer::start().await;
    let base = server.uri();
    // One request in total across both runs
    mount_body(&server, "/song.mp3", b"ID3", 1).await;

    let dir = TempDir::new().unwrap();
    let png = build_card(&json!({"name": "Ann", "bgm": format!("{}/song.mp3", base)}));

    let first = localize_card(
        &png,
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(first.stats.downloaded, 1);

    let second = localize_card(
        &png,
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(second.stats.downloaded, 0);
    assert_eq!(second.stats.reused, 1);
    assert_eq!(second.document["bgm"], "/niko/Ann/media/song.mp3");

    server.verify().await;
}

#[tokio::test]
async fn test_nested_stylesheet_references() {
    let server = MockServer::start().await;
    let base = server.uri();

    let css = format!("body {{ background: url('{}/img/bg.png'); }}", base);
    mount_body(&server, "/theme.css", css.as_bytes(), 1).await;
    mount_body(&server, "/img/bg.png", b"BG", 1).await;

    let dir = TempDir::new().unwrap();
    let document = json!({
        "name": "Ann",
        "data": {"creator_notes": format!("<link href=\"{}/theme.css\">", base)},
    });

    let card = localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(card.stats.discovered, 2);
    assert_eq!(card.stats.downloaded, 2);
    assert_eq!(
        card.document["data"]["creator_notes"],
        "<link href=\"/niko/Ann/assets/theme.css\">"
    );

    // Resources found inside stylesheets get hashed names at the root
    let root = dir.path().join("niko").join("Ann");
    let flat: Vec<String> = std::fs::read_dir(&root)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(flat.len(), 1);
    assert!(flat[0].ends_with(".png"));
    assert_eq!(std::fs::read(root.join(&flat[0])).unwrap(), b"BG");

    server.verify().await;
}

#[tokio::test]
async fn test_nested_script_references() {
    let server = MockServer::start().await;
    let base = server.uri();

    let js = format!("const bgm = \"{}/loop.ogg\";\nplay(bgm);", base);
    mount_body(&server, "/player.js", js.as_bytes(), 1).await;
    mount_body(&server, "/loop.ogg", b"OggS", 1).await;

    let dir = TempDir::new().unwrap();
    let document = json!({"name": "Ann", "script": format!("{}/player.js", base)});

    let card = localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(card.stats.downloaded, 2);
    assert!(dir.path().join("niko/Ann/media/loop.ogg").is_file());
    assert!(dir.path().join("niko/Ann/assets/player.js").is_file());

    server.verify().await;
}

#[tokio::test]
async fn test_card_without_references_completes() {
    let dir = TempDir::new().unwrap();
    let document = json!({"name": "Ann", "data": {"description": "Just text."}});

    let card = localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(card.stats.discovered, 0);
    assert_eq!(card.document, document);
    assert!(card.log.contains("Completed: all 0 references succeeded"));
}

#[tokio::test]
async fn test_stop_returns_log() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"SLOW".to_vec())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let document = json!({"name": "Ann", "avatar": format!("{}/slow.png", server.uri())});

    let stop = CancellationToken::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stop.cancel();
        });
    }

    let failure = localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(NullSink),
        stop,
    )
    .await
    .unwrap_err();

    assert!(failure.is_stopped());
    assert!(matches!(
        failure.error,
        LocalizerError::Pipeline(PipelineError::StoppedByCaller)
    ));
    assert!(failure.log.contains("[WARNING] Stop requested"));
    assert!(failure.log.contains("[WARNING] Localization stopped"));
}

#[tokio::test]
async fn test_sink_receives_messages() {
    let server = MockServer::start().await;
    mount_body(&server, "/a.png", b"A", 1).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let seen = Arc::clone(&seen);
        move |message: &str, severity: Severity| {
            seen.lock().unwrap().push((severity, message.to_string()));
        }
    };

    let dir = TempDir::new().unwrap();
    let document = json!({"name": "Ann", "avatar": format!("{}/a.png", server.uri())});
    localize_card(
        &build_card(&document),
        test_options(dir.path()),
        Arc::new(sink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen
        .iter()
        .any(|(s, m)| *s == Severity::Info && m.contains("Found 1 new references")));
    assert!(seen.iter().any(|(s, _)| *s == Severity::Success));
}

#[tokio::test]
async fn test_localize_card_file_writes_output() {
    let server = MockServer::start().await;
    mount_body(&server, "/portrait.webp", b"RIFF", 1).await;

    let dir = TempDir::new().unwrap();
    let card_path = dir.path().join("Ann.png");
    let document = json!({
        "data": {"name": "Ann: The Brave", "avatar": format!("{}/portrait.webp", server.uri())},
    });
    std::fs::write(&card_path, build_card(&document)).unwrap();

    let mut config = Config::default();
    config.localizer.base_path = Some(dir.path().join("public").to_string_lossy().to_string());

    let outcome = localize_card_file(
        &card_path,
        &config,
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let CardFileOutcome::Localized { output_path, card } = outcome else {
        panic!("expected the card to be localized");
    };

    assert_eq!(output_path, dir.path().join("localized").join("Ann.png"));
    let rewritten = decode_card(&std::fs::read(&output_path).unwrap()).unwrap();
    assert_eq!(
        rewritten["data"]["avatar"],
        "/niko/Ann： The Brave/images/portrait.webp"
    );
    assert!(dir
        .path()
        .join("public/niko/Ann： The Brave/images/portrait.webp")
        .is_file());
    assert!(card.log.contains("Card references 1 external resources"));
    assert!(card.log.contains("Saved localized card"));

    // The source card is untouched
    assert_eq!(std::fs::read(&card_path).unwrap(), build_card(&document));
}

#[tokio::test]
async fn test_localize_card_file_without_references() {
    let dir = TempDir::new().unwrap();
    let card_path = dir.path().join("plain.png");
    std::fs::write(&card_path, build_card(&json!({"name": "Plain"}))).unwrap();

    let outcome = localize_card_file(
        &card_path,
        &Config::default(),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, CardFileOutcome::NothingToLocalize { .. }));
    assert!(!dir.path().join("localized").exists());
}

#[tokio::test]
async fn test_localize_card_file_missing_file() {
    let dir = TempDir::new().unwrap();
    let failure = localize_card_file(
        &dir.path().join("missing.png"),
        &Config::default(),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.error, LocalizerError::Io(_)));
    assert!(failure.log.contains("[FAILURE]"));
}
