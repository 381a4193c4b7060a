use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tempfile::TempDir;

use runner::{AnalyzerCommand, ProcessAnalyzer, RunnerConfig};
use server::config::{AppConfig, CorsConfig, LoggingConfig, ServerConfig};
use server::state::AppState;

pub mod routes {
    pub const HEALTH: &str = "/";
    pub const PROCESS: &str = "/api/process";

    pub fn photos(location: &str) -> String {
        format!("/api/upload/photos/{location}")
    }

    pub fn manufacturer(location: &str) -> String {
        format!("/api/upload/manufacturer/{location}")
    }

    pub fn jha_pdfs(location: &str) -> String {
        format!("/api/upload/jha/{location}/pdfs")
    }

    pub fn jha_excel(location: &str) -> String {
        format!("/api/upload/jha/{location}/excel")
    }

    pub fn jha_process(location: &str) -> String {
        format!("/api/jhaprocess/{location}")
    }
}

/// Shell prelude for stub analyzers: parses the runner's flags into
/// `$location`, `$out` and `$uploads`, and records the call in `$root/invoked`.
const STUB_PRELUDE: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --location) location="$2"; shift 2 ;;
    --output) out="$2"; shift 2 ;;
    --uploads_root) uploads="$2"; shift 2 ;;
    *) shift ;;
  esac
done
root="$(dirname "$uploads")"
echo "$location" >> "$root/invoked"
"#;

/// Stub that writes `equipment_inventory.csv` from the photo names it finds.
pub const EQUIPMENT_OK: &str = r#"
echo "Processing location $location"
{
  echo "photo"
  ls "$uploads/photos/$location"
} > "$out/equipment_inventory.csv"
"#;

/// Stub that writes the hazard workbook next to the uploads root.
pub const JHA_OK: &str = r#"
printf 'WORKBOOK' > "$root/output/jha_processed.xlsb"
"#;

/// A running test server over a temporary staging root.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    /// Staging root seen by the server and the stub analyzers.
    pub root: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    /// Server whose analyzers both run `/bin/sh` with the given script bodies.
    pub async fn spawn_with(equipment: &str, jha: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path().join("data");
        std::fs::create_dir_all(&root).unwrap();
        let root = root.canonicalize().unwrap();

        let runner = RunnerConfig {
            timeout_secs: 10,
            equipment: stub_command(dir.path(), "equipment.sh", equipment),
            jha: stub_command(dir.path(), "jha.sh", jha),
            ..RunnerConfig::default()
        };

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec!["*".to_string()],
                    max_age: 3600,
                },
                max_upload_bytes: 16 * 1024 * 1024,
            },
            storage: common::config::StorageConfig { root: root.clone() },
            runner,
            logging: LoggingConfig {
                filter: "info".to_string(),
                error_log: None,
            },
        };

        let store = common::storage::FilesystemStore::new(root.clone())
            .await
            .expect("Failed to open staging root");
        let state = AppState::new(app_config, Arc::new(store), Arc::new(ProcessAnalyzer));
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            root,
            _dir: dir,
        }
    }

    pub async fn spawn() -> Self {
        Self::spawn_with(EQUIPMENT_OK, JHA_OK).await
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// Multipart upload with every file under the same field name.
    pub async fn upload(&self, path: &str, field: &str, files: &[(&str, &[u8])]) -> TestResponse {
        let mut form = reqwest::multipart::Form::new();
        for (name, data) in files {
            let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(name.to_string());
            form = form.part(field.to_string(), part);
        }

        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Stage two photos and a manufacturer sheet for `location`.
    pub async fn stage_equipment(&self, location: &str) {
        let res = self
            .upload(
                &routes::photos(location),
                "photos[]",
                &[("IMG_1.jpg", b"jpeg-1"), ("IMG_2.png", b"png-2")],
            )
            .await;
        assert_eq!(res.status, 200, "Photo upload failed: {}", res.text);

        let res = self
            .upload(
                &routes::manufacturer(location),
                "file",
                &[("parts.xlsx", b"sheet")],
            )
            .await;
        assert_eq!(res.status, 200, "Sheet upload failed: {}", res.text);
    }

    pub fn staged(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    /// Results moved aside for delivery but not yet removed.
    pub fn pending_deliveries(&self) -> Vec<String> {
        std::fs::read_dir(self.root.join("output/.deliver"))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Locations the stub analyzers were invoked for, in order.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.root.join("invoked"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn stub_command(dir: &Path, name: &str, body: &str) -> AnalyzerCommand {
    let path = dir.join(name);
    std::fs::write(&path, format!("{STUB_PRELUDE}{body}")).expect("Failed to write stub");
    AnalyzerCommand::new("/bin/sh", [path.to_string_lossy().into_owned()])
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
