use scrape_batch::config::{
    Config, FetcherConfig, OutputConfig, ParserKind, PolicyFetchFailure, SiteParserConfig,
    UserAgentConfig,
};
use scrape_batch::crawler::{Extraction, Orchestrator};
use scrape_batch::extract::{CompanyRecord, RecordStore};
use scrape_batch::input::load_urls;
use scrape_batch::storage::{url_digest, LOG_HEADER};
use scrape_batch::FetchState;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestBot/1.0 (+https://example.com/contact)";

/// Creates a test configuration writing everything under `dir`
fn create_test_config(dir: &Path) -> Config {
    Config {
        fetcher: FetcherConfig {
            max_retries: 3,
            backoff_base: 2.0,
            min_delay_secs: 0.0,
            timeout_secs: 2,
            // Keep real-time backoff short
            max_backoff_secs: Some(0.05),
            ..FetcherConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        output: OutputConfig {
            raw_dir: dir.join("raw_pages"),
            raw_extension: "html".to_string(),
            log_path: dir.join("logs").join("run_log.csv"),
            extracted_dir: dir.join("extracted"),
        },
        site_parsers: vec![],
    }
}

async fn mount_robots(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn url(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).unwrap()
}

fn read_log(config: &Config) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(&config.output.log_path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        LOG_HEADER.to_vec()
    );
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn raw_file_count(config: &Config) -> usize {
    std::fs::read_dir(&config.output.raw_dir).unwrap().count()
}

#[tokio::test]
async fn test_full_run_mixed_outcomes() {
    let server = MockServer::start().await;
    mount_robots(&server, 200, "User-agent: *\nDisallow: /private").await;
    mount_page(&server, "/ok", 200, "hi").await;

    // Two failures, then success
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", 200, "<h1>Flaky Inc</h1>").await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let orchestrator = Orchestrator::new(config.clone()).unwrap();

    let targets = vec![
        url(&server, "/ok"),
        url(&server, "/flaky"),
        url(&server, "/private"),
        url(&server, "/down"),
        url(&server, "/ok"),
    ];
    let report = orchestrator.run(&targets).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.blocked, 1);
    assert_eq!(report.exhausted, 1);

    let outcomes: Vec<_> = report.outcomes().collect();
    assert_eq!(outcomes[0].attempts.len(), 1);
    assert_eq!(outcomes[1].attempts.len(), 3);
    assert_eq!(outcomes[2].state, FetchState::Blocked);
    assert!(outcomes[2].attempts.is_empty());
    assert_eq!(outcomes[3].attempts.len(), 4);
    assert_eq!(outcomes[3].terminal_error.as_deref(), Some("status_503"));

    let ok_path = outcomes[0].stored.as_ref().unwrap().path.clone();
    assert_eq!(std::fs::read(&ok_path).unwrap(), b"hi");
    assert_eq!(
        ok_path.file_name().unwrap().to_str().unwrap(),
        format!("{}.html", url_digest(targets[0].as_str()))
    );
    assert_eq!(raw_file_count(&config), 2);

    let rows = read_log(&config);
    assert_eq!(rows.len(), 4);

    assert_eq!(rows[0][1], targets[0].as_str());
    assert_eq!(rows[0][2], "200");
    assert_eq!(rows[0][4], "0");
    assert_eq!(rows[0][5], ok_path.display().to_string());
    assert_eq!(rows[0][6], "");

    assert_eq!(rows[1][2], "200");
    assert_eq!(rows[1][4], "2");

    assert_eq!(rows[2][2], "");
    assert_eq!(rows[2][3], "0.000");
    assert_eq!(rows[2][4], "0");
    assert_eq!(rows[2][5], "");
    assert_eq!(rows[2][6], "blocked_by_robots");

    assert_eq!(rows[3][2], "503");
    assert_eq!(rows[3][4], "3");
    assert_eq!(rows[3][5], "");
    assert_eq!(rows[3][6], "status_503");
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;
    mount_robots(&server, 404, "").await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(create_test_config(dir.path())).unwrap();

    let report = orchestrator.run(&[url(&server, "/page")]).await.unwrap();
    assert_eq!(report.succeeded, 1);
}

#[tokio::test]
async fn test_agent_specific_robots_group() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        200,
        "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(create_test_config(dir.path())).unwrap();

    let report = orchestrator.run(&[url(&server, "/page")]).await.unwrap();
    assert_eq!(report.blocked, 1);
}

#[tokio::test]
async fn test_robots_forbidden_blocks_origin() {
    let server = MockServer::start().await;
    mount_robots(&server, 403, "forbidden").await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let orchestrator = Orchestrator::new(config.clone()).unwrap();

    let report = orchestrator
        .run(&[url(&server, "/a"), url(&server, "/b")])
        .await
        .unwrap();

    assert_eq!(report.blocked, 2);
    assert_eq!(raw_file_count(&config), 0);
    assert!(read_log(&config).iter().all(|row| row[6] == "blocked_by_robots"));
}

#[tokio::test]
async fn test_robots_server_error_blocks_under_either_failure_policy() {
    for policy in [PolicyFetchFailure::Allow, PolicyFetchFailure::Deny] {
        let server = MockServer::start().await;
        mount_robots(&server, 500, "").await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("content"))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(dir.path());
        config.fetcher.on_policy_fetch_failure = policy;
        let orchestrator = Orchestrator::new(config.clone()).unwrap();

        let report = orchestrator.run(&[url(&server, "/page")]).await.unwrap();
        assert_eq!(
            report.urls[0].outcome.state,
            FetchState::Blocked,
            "policy {:?}",
            policy
        );
        assert_eq!(raw_file_count(&config), 0);
    }
}

#[tokio::test]
async fn test_rerun_appends_log_and_overwrites_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/page", 200, "same body").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let targets = [url(&server, "/page")];

    for _ in 0..2 {
        let orchestrator = Orchestrator::new(config.clone()).unwrap();
        orchestrator.run(&targets).await.unwrap();
    }

    let rows = read_log(&config);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][5], rows[1][5]);
    assert_eq!(raw_file_count(&config), 1);
}

#[tokio::test]
async fn test_site_parser_extraction() {
    let server = MockServer::start().await;
    mount_robots(&server, 404, "").await;
    mount_page(
        &server,
        "/company",
        200,
        r#"<html><body>
            <h1 class="company-title">Example Co</h1>
            <div class="company-description"> Builds things. </div>
            <a href="https://www.linkedin.com/company/example-co">LinkedIn</a>
            <p>Mail INFO@EXAMPLE.CO or call +1 (555) 010-9999</p>
        </body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.site_parsers.push(SiteParserConfig {
        host: "127.0.0.1".to_string(),
        kind: ParserKind::Selectors,
        name_selector: Some("h1.company-title".to_string()),
        description_selector: Some("div.company-description".to_string()),
    });
    let orchestrator = Orchestrator::new(config.clone()).unwrap();

    let target = url(&server, "/company");
    let report = orchestrator.run(&[target.clone()]).await.unwrap();
    assert_eq!(report.extracted, 1);

    let records = RecordStore::open(&config.output.extracted_dir).unwrap();
    let Extraction::Saved(saved) = &report.urls[0].extraction else {
        panic!("record not saved: {:?}", report.urls[0].extraction);
    };
    assert_eq!(*saved, records.path_for(target.as_str()));

    let record: CompanyRecord = records.load(target.as_str()).await.unwrap().unwrap();
    assert_eq!(record.company_name.as_deref(), Some("Example Co"));
    assert_eq!(record.description.as_deref(), Some("Builds things."));
    assert_eq!(record.email, vec!["info@example.co"]);
    assert_eq!(record.phone, vec!["+15550109999"]);
    assert_eq!(
        record.social_links,
        vec!["https://www.linkedin.com/company/example-co"]
    );
    assert_eq!(record.source_url, target.as_str());
}

#[tokio::test]
async fn test_input_csv_drives_run() {
    let server = MockServer::start().await;
    mount_robots(&server, 404, "").await;
    mount_page(&server, "/one", 200, "1").await;
    mount_page(&server, "/two", 200, "2").await;

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("company_urls.csv");
    let mut file = std::fs::File::create(&input).unwrap();
    writeln!(file, "name,url").unwrap();
    writeln!(file, "One,{}", url(&server, "/one")).unwrap();
    writeln!(file, "Blank,").unwrap();
    writeln!(file, "Bad,mailto:someone@example.com").unwrap();
    writeln!(file, "Two,{}", url(&server, "/two")).unwrap();
    writeln!(file, "Again,{}", url(&server, "/one")).unwrap();
    drop(file);

    let targets = load_urls(&input).unwrap();
    assert_eq!(targets.urls.len(), 2);
    assert_eq!(targets.duplicates, 1);
    assert_eq!(targets.rejected.len(), 1);

    let config = create_test_config(dir.path());
    let report = Orchestrator::new(config.clone())
        .unwrap()
        .without_extraction()
        .run(&targets.urls)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(read_log(&config).len(), 2);
    assert!(!config.output.extracted_dir.exists());
}
