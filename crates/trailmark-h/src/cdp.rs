use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use trailmark_engine::config::schema::ChromiumConfig;

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    console_task: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(
        headless: bool,
        config: &ChromiumConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut config_builder = BrowserConfig::builder();
        if config.no_sandbox {
            config_builder = config_builder.no_sandbox();
        }
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        }

        // CHROME_BIN wins over the configured executable
        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        } else if let Some(executable) = &config.executable {
            tracing::info!("Using configured Chrome binary: {}", executable.display());
            config_builder = config_builder.chrome_executable(executable);
        }

        let (browser, mut handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                    continue;
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        let mut console_events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

        let console_task = tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let args_str: Vec<String> = event
                    .args
                    .iter()
                    .map(|arg| {
                        arg.description
                            .clone()
                            .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                            .unwrap_or_else(|| "unknown".to_string())
                    })
                    .collect();
                tracing::debug!(
                    "Browser Console [{:?}]: {}",
                    event.r#type,
                    args_str.join(" ")
                );
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            console_task,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.console_task.abort();
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if self.cleanup_user_data_dir
            && let Some(dir) = &self.user_data_dir
            && let Err(e) = std::fs::remove_dir_all(dir)
        {
            tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
        }

        Ok(())
    }
}

fn resolve_user_data_dir() -> Result<(PathBuf, bool), Box<dyn std::error::Error + Send + Sync>> {
    if let Ok(dir) = std::env::var("TRAILMARK_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!(
            "Using user data dir from TRAILMARK_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let unique = format!("trailmark-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
