use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(
        url: &str,
        capabilities: Option<Map<String, Value>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut caps = Map::new();
        if let Some(user_caps) = capabilities {
            for (k, v) in user_caps {
                caps.insert(k, v);
            }
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(url)
            .await
            .map_err(|e| format!("Failed to connect to WebDriver at {}: {}", url, e))?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.client
            .close()
            .await
            .map_err(|e| format!("Failed to close session: {}", e))?;
        Ok(())
    }
}

/// Capabilities for a geckodriver session.
pub fn firefox_capabilities(headless: bool) -> Map<String, Value> {
    let args: Vec<&str> = if headless { vec!["-headless"] } else { Vec::new() };
    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("firefox"));
    caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_firefox_passes_flag() {
        let caps = firefox_capabilities(true);
        assert_eq!(caps["moz:firefoxOptions"]["args"], json!(["-headless"]));
        assert_eq!(caps["browserName"], "firefox");
    }

    #[test]
    fn headed_firefox_has_no_args() {
        let caps = firefox_capabilities(false);
        assert_eq!(caps["moz:firefoxOptions"]["args"], json!([]));
    }
}
