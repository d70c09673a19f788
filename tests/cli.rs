use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use hybrid_search::test_utils::UnitTestFixture;

/// `hsearch` isolated from user config, running against the in-process store.
fn hsearch(dir: &UnitTestFixture) -> Command {
    let mut cmd = Command::cargo_bin("hsearch").unwrap();
    cmd.current_dir(&dir.data_path)
        .env("HOME", &dir.data_path)
        .env("XDG_CONFIG_HOME", dir.data_path.join(".config"))
        .env_remove("HS_CONFIG")
        .env_remove("HS_STORE_BACKEND")
        .env_remove("HS_STORE_URL")
        .env_remove("ELASTIC_HOST")
        .env_remove("ELASTIC_API_KEY")
        .env("RUST_LOG", "error")
        .args(["--store", "memory"]);
    cmd
}

fn corpus() -> Value {
    json!([
        { "id": "apple", "content": "red apple orchard fruit", "content_vector": [0.9, 0.1, 0.0] },
        { "id": "banana", "content": "yellow banana fruit", "content_vector": [0.7, 0.7, 0.0] },
        { "id": "cherry", "content": "red cherry", "content_vector": [0.1, 0.9, 0.1] },
        { "id": "engine", "content": "diesel engine repair", "content_vector": [0.0, 0.1, 0.9] }
    ])
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_cli_help() {
    let dir = UnitTestFixture::new();
    hsearch(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_cli_version() {
    let dir = UnitTestFixture::new();
    hsearch(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_health_machine_output() {
    let dir = UnitTestFixture::new();
    let output = hsearch(&dir).args(["-m", "health"]).output().unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["status"], "alive");
    assert_eq!(json["data"]["store"]["name"], "memory");
}

#[test]
fn test_search_with_loaded_corpus() {
    let dir = UnitTestFixture::new();
    let docs = dir.write_documents("docs.json", &corpus());

    let output = hsearch(&dir)
        .args(["-m", "search", "--load"])
        .arg(&docs)
        .args(["--query", "red", "--vector", "0.9,0.1,0", "-n", "3"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    let hits = json["data"]["hits"].as_array().unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0]["document_id"], "apple");
    assert!(json["data"]["degraded"].is_null());
}

#[test]
fn test_search_human_output_with_explain() {
    let dir = UnitTestFixture::new();
    let docs = dir.write_documents("docs.json", &corpus());

    hsearch(&dir)
        .args(["-O", "plain", "search", "--load"])
        .arg(&docs)
        .args(["--query", "engine", "--explain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. engine"))
        .stdout(predicate::str::contains("lexical"));
}

#[test]
fn test_search_rejects_wrong_dimensions() {
    let dir = UnitTestFixture::new();
    let output = hsearch(&dir)
        .args(["-m", "search", "--query", "red", "--vector", "[0.1, 0.2]"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["data"]["code"], "DIMENSION_MISMATCH");
}

#[test]
fn test_search_without_query_parts_fails() {
    let dir = UnitTestFixture::new();
    hsearch(&dir)
        .args(["search"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid query"));
}

#[test]
fn test_reset_requires_yes() {
    let dir = UnitTestFixture::new();
    let output = hsearch(&dir).args(["-m", "reset"]).output().unwrap();
    assert!(!output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["data"]["code"], "DESTRUCTIVE_BLOCKED");
    assert_eq!(json["data"]["numeric_code"], 103);

    hsearch(&dir).args(["reset", "--yes"]).assert().success();
}

#[test]
fn test_ingest_reports_partial_rejection() {
    let dir = UnitTestFixture::new();
    let docs = dir.write_documents(
        "docs.json",
        &json!([
            { "id": "a", "content": "fine", "content_vector": [0.1, 0.2, 0.3] },
            { "id": "b", "content": "short", "content_vector": [0.1, 0.2] }
        ]),
    );

    let output = hsearch(&dir).args(["-m", "ingest"]).arg(&docs).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["accepted"], 1);
    assert_eq!(json["data"]["errors"][0]["id"], "b");
    assert_eq!(json["data"]["errors"][0]["kind"], "dimension_mismatch");
    assert_eq!(json["warnings"][0], "1 of 2 documents rejected");

    hsearch(&dir)
        .args(["ingest", "--strict"])
        .arg(&docs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Partial ingestion failure"));
}

#[test]
fn test_ingest_ndjson_reports_bad_lines() {
    let dir = UnitTestFixture::new();
    let path = dir.create_file(
        "docs.ndjson",
        "{\"id\": \"a\", \"content\": \"x\", \"content_vector\": [0.1, 0.2, 0.3]}\nnot json\n",
    );

    let output = hsearch(&dir).args(["-m", "ingest"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["accepted"], 1);
    assert_eq!(json["data"]["errors"][0]["id"], "line 2");
}

#[test]
fn test_ingest_reads_stdin() {
    let dir = UnitTestFixture::new();
    let output = hsearch(&dir)
        .args(["-m", "ingest", "-"])
        .write_stdin(corpus().to_string())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["accepted"], 4);
    assert_eq!(json["data"]["errors"], json!([]));
}

#[test]
fn test_project_config_is_honoured() {
    let dir = UnitTestFixture::new();
    dir.write_config("[index]\nname = \"articles\"\ndims = 2\n");

    let output = hsearch(&dir)
        .args(["-m", "search", "--vector", "1,0"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["data"]["hits"], json!([]));
}

#[test]
fn test_index_flag_selects_index() {
    let dir = UnitTestFixture::new();
    let output = hsearch(&dir)
        .args(["-m", "-i", "articles", "count"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["index"], "articles");
    assert_eq!(json["data"]["count"], 0);
}

#[test]
fn test_completions_bash() {
    let dir = UnitTestFixture::new();
    hsearch(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hsearch"));
}
