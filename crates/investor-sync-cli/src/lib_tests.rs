//! Tests for argument parsing and command execution.

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn json_file(value: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

fn config_file(api_url: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        "store:\n  api_key: secret_test\n  database_id: db-1\n  group_record_id: group-1\n  api_url: {}\n",
        api_url
    )
    .unwrap();
    file
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("investor-sync").chain(args.iter().copied())).unwrap()
}

fn parse_output(output: &str) -> serde_json::Value {
    serde_json::from_str(output).unwrap()
}

mod parsing {
    use super::*;

    #[test]
    fn test_global_defaults() {
        let cli = cli(&["normalize", "--file", "body.json"]);

        assert_eq!(cli.log_level, "warn");
        assert!(!cli.json_logs);
        assert!(matches!(cli.command, Commands::Normalize { .. }));
    }

    #[test]
    fn test_save_flags() {
        let cli = cli(&[
            "--config",
            "svc.yaml",
            "save",
            "--file",
            "attrs.json",
            "--record-id",
            "page-7",
            "--update-existing",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("svc.yaml")));
        match cli.command {
            Commands::Save {
                record_id,
                update_existing,
                ..
            } => {
                assert_eq!(record_id.as_deref(), Some("page-7"));
                assert!(update_existing);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["investor-sync"]).is_err());
    }
}

mod normalize_command {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_prints_event_and_attributes() {
        let body = json_file(json!({
            "event": "investor.funded",
            "investor": {"email": "ada@example.com", "first_name": "Ada"}
        }));

        let output = run(cli(&["normalize", "--file", body.path().to_str().unwrap()]))
            .await
            .unwrap();

        let value = parse_output(&output);
        assert_eq!(value["event"], "investor.funded");
        assert_eq!(value["attributes"]["email"], "ada@example.com");
        assert_eq!(value["attributes"]["investor_state"], "funded");
    }

    #[tokio::test]
    async fn test_missing_contact_is_validation_error() {
        let body = json_file(json!({"event": "investor.created", "investor": {}}));

        let err = run(cli(&["normalize", "--file", body.path().to_str().unwrap()]))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_io_error() {
        let err = run(cli(&["normalize", "--file", "/nonexistent/body.json"]))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Io(_)));
        assert!(err.to_string().contains("/nonexistent/body.json"));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_invalid_json_is_invalid_argument() {
        let mut body = NamedTempFile::new().unwrap();
        write!(body, "{{not json").unwrap();

        let err = run(cli(&["normalize", "--file", body.path().to_str().unwrap()]))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }
}

mod store_commands {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_creates_record() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .and(body_partial_json(json!({"parent": {"database_id": "db-1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "page",
                "id": "page-1",
                "properties": {}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config_file(&mock_server.uri());
        let attrs = json_file(json!({"email": "ada@example.com", "first_name": "Ada"}));

        let output = run(cli(&[
            "--config",
            config.path().to_str().unwrap(),
            "save",
            "--file",
            attrs.path().to_str().unwrap(),
        ]))
        .await
        .unwrap();

        let value = parse_output(&output);
        assert_eq!(value["action"], "created");
        assert_eq!(value["record_id"], "page-1");
    }

    #[tokio::test]
    async fn test_save_with_record_id_updates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/pages/page-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "page",
                "id": "page-7",
                "properties": {}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config_file(&mock_server.uri());
        let attrs = json_file(json!({"phone": "+15550100"}));

        let output = run(cli(&[
            "--config",
            config.path().to_str().unwrap(),
            "save",
            "--file",
            attrs.path().to_str().unwrap(),
            "--record-id",
            "page-7",
        ]))
        .await
        .unwrap();

        assert_eq!(parse_output(&output)["action"], "updated");
    }

    #[tokio::test]
    async fn test_save_store_failure_exit_code() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "object": "error",
                "status": 500,
                "message": "internal"
            })))
            .mount(&mock_server)
            .await;

        let config = config_file(&mock_server.uri());
        let attrs = json_file(json!({"email": "ada@example.com"}));

        let err = run(cli(&[
            "--config",
            config.path().to_str().unwrap(),
            "save",
            "--file",
            attrs.path().to_str().unwrap(),
        ]))
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::Upsert(UpsertError::CreateFailed(_))));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_lookup_reports_match() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/databases/db-1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "results": [{
                    "object": "page",
                    "id": "page-3",
                    "properties": {
                        "Email": {"type": "email", "email": "ada@example.com"}
                    }
                }],
                "has_more": false,
                "next_cursor": null
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config_file(&mock_server.uri());

        let output = run(cli(&[
            "--config",
            config.path().to_str().unwrap(),
            "lookup",
            "--email",
            "ada@example.com",
        ]))
        .await
        .unwrap();

        let value = parse_output(&output);
        assert_eq!(value["found"], true);
        assert_eq!(value["record_id"], "page-3");
        assert_eq!(value["matched_by"], "email");
    }

    #[tokio::test]
    async fn test_lookup_without_identity_is_invalid_argument() {
        let err = run(cli(&["lookup", "--email", "  "])).await.unwrap_err();

        assert!(matches!(err, CliError::InvalidArgument { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}

mod config_command {
    use super::*;

    #[tokio::test]
    async fn test_show_redacts_api_key() {
        let config = config_file("https://store.example");

        let output = run(cli(&[
            "--config",
            config.path().to_str().unwrap(),
            "config",
            "--show",
        ]))
        .await
        .unwrap();

        assert!(!output.contains("secret_test"));
        let value = parse_output(&output);
        assert_eq!(value["store"]["api_key"], "<REDACTED>");
        assert_eq!(value["store"]["database_id"], "db-1");
    }

    #[tokio::test]
    async fn test_incomplete_config_exit_code() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "store:\n  database_id: db-1\n").unwrap();

        let err = run(cli(&["--config", file.path().to_str().unwrap(), "config"]))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Configuration(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
