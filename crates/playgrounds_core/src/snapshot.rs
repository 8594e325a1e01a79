use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ImportError, ImportResult};

pub const DEFAULT_SNAPSHOT_BASE_URL: &str =
    "https://search-playground.mongodb.com/api/tools/code-playground/snapshots";

const USER_AGENT: &str = concat!("playgrounds/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(rename = "snapshotId", alias = "id")]
    pub id: String,
    pub name: String,
    pub search_config: SearchConfig,
    pub retain_indefinitely: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub aggregation_pipeline: String,
    pub index_definition: String,
    pub documents: String,
    pub synonyms: String,
}

impl Snapshot {
    pub fn has_documents(&self) -> bool {
        !self.search_config.documents.trim().is_empty()
    }

    pub fn has_synonyms(&self) -> bool {
        !self.search_config.synonyms.trim().is_empty()
    }
}

/// Anything that can hand back a snapshot for an identifier.
pub trait SnapshotSource {
    fn fetch(&self, snapshot_id: &str) -> ImportResult<Snapshot>;
}

#[derive(Debug, Clone)]
pub struct SnapshotClient {
    client: Client,
    base_url: String,
}

impl SnapshotClient {
    pub fn new(base_url: &str, timeout: Duration) -> ImportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| ImportError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn snapshot_url(&self, snapshot_id: &str) -> String {
        format!("{}/{}", self.base_url, snapshot_id)
    }
}

impl SnapshotSource for SnapshotClient {
    fn fetch(&self, snapshot_id: &str) -> ImportResult<Snapshot> {
        let url = self.snapshot_url(snapshot_id);
        debug!(%url, "fetching playground snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| ImportError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|source| ImportError::Transport {
            url: url.clone(),
            source,
        })?;
        decode_response(status, &url, &body)
    }
}

/// Turn a raw response into a snapshot. The body is only looked at on 200.
pub fn decode_response(status: u16, url: &str, body: &str) -> ImportResult<Snapshot> {
    if status != StatusCode::OK.as_u16() {
        return Err(ImportError::Fetch {
            status,
            url: url.to_string(),
        });
    }
    decode_snapshot(body)
}

pub fn decode_snapshot(body: &str) -> ImportResult<Snapshot> {
    let snapshot: Snapshot = serde_json::from_str(body)
        .map_err(|err| ImportError::Decode(format!("failed to unmarshal response: {err}")))?;
    validate_documents_shape(&snapshot)?;
    Ok(snapshot)
}

fn validate_documents_shape(snapshot: &Snapshot) -> ImportResult<()> {
    if !snapshot.has_documents() {
        return Ok(());
    }
    let value: Value = serde_json::from_str(&snapshot.search_config.documents)
        .map_err(|err| ImportError::Decode(format!("documents payload is not JSON: {err}")))?;
    if !value.is_array() {
        return Err(ImportError::Decode(format!(
            "documents payload must be an array, found {}",
            json_kind(&value)
        )));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use serde_json::json;

    use super::{SnapshotClient, SnapshotSource, decode_response, decode_snapshot};
    use crate::error::ImportError;

    fn sample_body() -> String {
        json!({
            "snapshotId": "xyz9",
            "name": "Vector Search Demo",
            "searchConfig": {
                "aggregationPipeline": "[{\"$search\": {\"text\": {\"query\": \"baseball\", \"path\": \"plot\"}}}]",
                "indexDefinition": "{\"mappings\": {\"dynamic\": true}}",
                "documents": "[{\"plot\": \"baseball\"}, {\"plot\": \"soccer\"}]",
                "synonyms": ""
            },
            "retainIndefinitely": true
        })
        .to_string()
    }

    fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).expect("read") == 0 || line == "\r\n" {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write");
        });
        format!("http://{address}/snapshots")
    }

    #[test]
    fn decode_snapshot_reads_camel_case_fields() {
        let snapshot = decode_snapshot(&sample_body()).expect("decode");
        assert_eq!(snapshot.id, "xyz9");
        assert_eq!(snapshot.name, "Vector Search Demo");
        assert!(snapshot.retain_indefinitely);
        assert!(snapshot.has_documents());
        assert!(!snapshot.has_synonyms());
        assert!(snapshot.search_config.index_definition.contains("dynamic"));
    }

    #[test]
    fn decode_snapshot_tolerates_missing_fields() {
        let snapshot = decode_snapshot(r#"{"id": "abc"}"#).expect("decode");
        assert_eq!(snapshot.id, "abc");
        assert!(snapshot.name.is_empty());
        assert!(!snapshot.has_documents());
    }

    #[test]
    fn not_found_is_reported_without_decoding() {
        let err = decode_response(404, "https://host.test/snapshots/nope", "<html>not json</html>")
            .expect_err("must fail");
        match err {
            ImportError::Fetch { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode_response(200, "https://host.test/x", "{not json").expect_err("must fail");
        assert!(matches!(err, ImportError::Decode(_)));
    }

    #[test]
    fn non_array_documents_are_a_decode_error() {
        let body = json!({
            "snapshotId": "a",
            "searchConfig": { "documents": "{\"plot\": \"x\"}" }
        })
        .to_string();
        let err = decode_snapshot(&body).expect_err("must fail");
        let ImportError::Decode(message) = err else {
            panic!("expected decode error");
        };
        assert!(message.contains("object"));
    }

    #[test]
    fn client_fetches_snapshot_by_identifier() {
        let base = serve_once("200 OK", sample_body());
        let client = SnapshotClient::new(&base, Duration::from_secs(5)).expect("client");
        assert_eq!(client.snapshot_url("xyz9"), format!("{base}/xyz9"));
        let snapshot = client.fetch("xyz9").expect("fetch");
        assert_eq!(snapshot.name, "Vector Search Demo");
    }

    #[test]
    fn client_surfaces_non_ok_status() {
        let base = serve_once("404 Not Found", "<html>not found</html>".to_string());
        let client = SnapshotClient::new(&base, Duration::from_secs(5)).expect("client");
        let err = client.fetch("missing").expect_err("must fail");
        assert!(matches!(err, ImportError::Fetch { status: 404, .. }));
    }
}
