use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Common paths where WPEWebDriver might be installed
const WEBDRIVER_PATHS: &[&str] = &["/usr/bin/WPEWebDriver", "/usr/local/bin/WPEWebDriver"];

/// Common paths where COG might be installed
const COG_PATHS: &[&str] = &[
    "/usr/bin/cog",
    "/usr/local/bin/cog",
    "/snap/bin/wpe-webkit-mir-kiosk.cog",
    "/snap/bin/cog",
];

const WPE_BACKEND_LIBS: &[&str] = &[
    "/usr/lib64/libWPEBackend-fdo-1.0.so",
    "/usr/lib/libWPEBackend-fdo-1.0.so",
    "/usr/lib/x86_64-linux-gnu/libWPEBackend-fdo-1.0.so",
    "/usr/lib/aarch64-linux-gnu/libWPEBackend-fdo-1.0.so",
    "/usr/lib64/libWPEBackend-fdo-1.0.so.1",
    "/usr/lib/libWPEBackend-fdo-1.0.so.1",
    "/usr/lib/x86_64-linux-gnu/libWPEBackend-fdo-1.0.so.1",
    "/usr/lib/aarch64-linux-gnu/libWPEBackend-fdo-1.0.so.1",
];

/// Detect if we're in a headless environment (no display server)
pub fn is_headless_environment() -> bool {
    std::env::var("DISPLAY").is_err() && std::env::var("WAYLAND_DISPLAY").is_err()
}

/// Look `name` up on PATH, then in the `fallbacks`.
pub fn find_binary(name: &str, fallbacks: &[&str]) -> Option<String> {
    if let Ok(output) = Command::new("which").arg(name).output()
        && output.status.success()
        && let Ok(path) = String::from_utf8(output.stdout)
    {
        let path = path.trim();
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    fallbacks
        .iter()
        .find(|path| Path::new(path).exists())
        .map(|path| path.to_string())
}

/// WPEWebDriver expects a "MiniBrowser" binary; point one at COG in a private directory.
fn create_minibrowser_symlink(cog_path: &str) -> Result<PathBuf, String> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let unique_id = format!(
        "{}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    );

    let temp_dir = std::env::temp_dir().join(format!("trailmark-wpe-{}", unique_id));
    std::fs::create_dir_all(&temp_dir)
        .map_err(|e| format!("Failed to create temp directory: {}", e))?;

    #[cfg(unix)]
    std::os::unix::fs::symlink(cog_path, temp_dir.join("MiniBrowser"))
        .map_err(|e| format!("Failed to create MiniBrowser symlink: {}", e))?;

    #[cfg(not(unix))]
    return Err("MiniBrowser symlink creation only supported on Unix".to_string());

    Ok(temp_dir)
}

/// Handle to a running WPEWebDriver process. Killed on drop.
pub struct CogProcess {
    child: Child,
    port: u16,
    temp_dir: PathBuf,
}

impl CogProcess {
    pub fn webdriver_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl Drop for CogProcess {
    fn drop(&mut self) {
        info!("Shutting down WPEWebDriver process...");
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

/// Launch WPEWebDriver, which spawns COG when a session is created.
pub async fn launch_cog(port: u16, force_headless: bool) -> Result<CogProcess, String> {
    let webdriver_path = find_binary("WPEWebDriver", WEBDRIVER_PATHS).ok_or_else(|| {
        "WPEWebDriver not found. Install with: sudo dnf install wpewebkit (includes WPEWebDriver)"
            .to_string()
    })?;
    let cog_path = find_binary("cog", COG_PATHS)
        .ok_or_else(|| "COG not found. Install with: sudo dnf install cog".to_string())?;

    if !WPE_BACKEND_LIBS.iter().any(|path| Path::new(path).exists()) {
        return Err("WPE backend (libWPEBackend-fdo-1.0.so) not found in standard paths. Please install 'libwpebackend-fdo-1.0-1' or equivalent.".to_string());
    }

    let temp_dir = create_minibrowser_symlink(&cog_path)?;
    info!(
        "Created MiniBrowser symlink: {} -> {}",
        temp_dir.join("MiniBrowser").display(),
        cog_path
    );

    let current_path = std::env::var("PATH").unwrap_or_default();
    let new_path = format!("{}:{}", temp_dir.display(), current_path);

    info!("Launching WPEWebDriver from: {}", webdriver_path);
    let mut cmd = Command::new(&webdriver_path);
    cmd.args([&format!("--port={}", port)])
        .env("PATH", &new_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if force_headless || is_headless_environment() {
        info!("Using COG native headless platform");
        cmd.env("COG_PLATFORM_NAME", "headless");
        if std::env::var("XDG_RUNTIME_DIR").is_err() {
            cmd.env("XDG_RUNTIME_DIR", "/tmp");
        }
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&temp_dir);
            return Err(format!("Failed to launch WPEWebDriver: {}", e));
        }
    };
    info!("WPEWebDriver launched with PID: {}", child.id());

    // From here on dropping the handle cleans up the process and the symlink.
    let process = CogProcess {
        child,
        port,
        temp_dir,
    };

    let url = format!("{}/status", process.webdriver_url());
    let client = reqwest::Client::new();
    for attempt in 1..=30 {
        sleep(Duration::from_millis(200)).await;

        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("WPEWebDriver ready after {} attempts", attempt);
                return Ok(process);
            }
            Ok(_) => warn!("WPEWebDriver responded but not ready yet (attempt {})", attempt),
            Err(_) => {
                if attempt % 5 == 0 {
                    info!("Waiting for WPEWebDriver... (attempt {})", attempt);
                }
            }
        }
    }

    Err("WPEWebDriver did not become ready within timeout".to_string())
}

/// WPEWebDriver defaults to MiniBrowser, which the PATH override resolves to COG.
pub fn wpe_capabilities() -> serde_json::Map<String, serde_json::Value> {
    serde_json::Map::new()
}
