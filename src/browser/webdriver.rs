//! W3C WebDriver client driving a headless Chrome.
//!
//! Speaks plain HTTP/JSON to a chromedriver (or Selenium-compatible)
//! endpoint: session create, navigate, element lookup, form fill,
//! screenshot, session delete. Element waits poll until the configured
//! step timeout elapses.

use super::{BrowserError, PanelBrowser, PanelSession, Result};
use crate::api::models::Credential;
use crate::config::BrowserConfig;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as Base64};
use bytes::Bytes;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

// W3C element identifier key in element lookup responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const USERNAME_SELECTOR: &str = "input[name='user']";
const PASSWORD_SELECTOR: &str = "input[name='password']";
const SUBMIT_SELECTOR: &str = "button[type='submit']";
// Application shell rendered only after a successful login.
const APP_READY_SELECTOR: &str = "div.main-view";

fn panel_selector(panel_id: i64) -> String {
    format!("#panel-{panel_id} div.panel-content canvas")
}

pub struct WebDriverBrowser {
    http: reqwest::Client,
    endpoint: String,
    step_timeout: Duration,
    poll_interval: Duration,
}

impl WebDriverBrowser {
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.step_timeout())
            .build()
            .map_err(|e| BrowserError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.webdriver_url.trim_end_matches('/').to_string(),
            step_timeout: config.step_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    async fn create_session(&self) -> Result<WebDriverSession> {
        let caps = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--window-size=1920,1080"]
                    }
                }
            }
        });

        let value = webdriver_call(
            &self.http,
            reqwest::Method::POST,
            &format!("{}/session", self.endpoint),
            Some(&caps),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Protocol("session response missing sessionId".into()))?;

        Ok(WebDriverSession {
            http: self.http.clone(),
            session_url: format!("{}/session/{}", self.endpoint, session_id),
            step_timeout: self.step_timeout,
            poll_interval: self.poll_interval,
        })
    }
}

#[async_trait]
impl PanelBrowser for WebDriverBrowser {
    async fn login(&self, base_url: &str, auth: &Credential) -> Result<Box<dyn PanelSession>> {
        let (username, password) = auth
            .basic()
            .ok_or(BrowserError::BasicCredentialRequired)?;

        let session = self.create_session().await?;

        // Close the session on any login failure; a leaked browser session
        // pins a whole headless Chrome.
        let outcome = session.run_login(base_url, username, password).await;
        if let Err(e) = outcome {
            session.close().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

struct WebDriverSession {
    http: reqwest::Client,
    session_url: String,
    step_timeout: Duration,
    poll_interval: Duration,
}

impl WebDriverSession {
    async fn run_login(&self, base_url: &str, username: &str, password: &str) -> Result<()> {
        let login_url = format!("{base_url}/login");
        debug!(url = %login_url, "Driving UI login");

        self.navigate(&login_url).await?;

        let user_field = self.wait_visible(USERNAME_SELECTOR).await?;
        self.send_keys(&user_field, username).await?;

        let password_field = self.wait_visible(PASSWORD_SELECTOR).await?;
        self.send_keys(&password_field, password).await?;

        let submit = self.find_element(SUBMIT_SELECTOR).await?.ok_or_else(|| {
            BrowserError::Protocol(format!("login page has no {SUBMIT_SELECTOR}"))
        })?;
        self.click(&submit).await?;

        // The shell only renders once the login round-trip finished.
        self.wait_visible(APP_READY_SELECTOR).await?;

        Ok(())
    }

    async fn call(&self, method: reqwest::Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.session_url, path);
        webdriver_call(&self.http, method, &url, body).await
    }

    async fn navigate(&self, target: &str) -> Result<()> {
        self.call(reqwest::Method::POST, "/url", Some(&json!({"url": target})))
            .await?;
        Ok(())
    }

    /// Look up one element by CSS selector. Absent elements are `None`;
    /// only transport/protocol problems error.
    async fn find_element(&self, selector: &str) -> Result<Option<String>> {
        let body = json!({"using": "css selector", "value": selector});
        match self.call(reqwest::Method::POST, "/element", Some(&body)).await {
            Ok(value) => {
                let id = value
                    .get(ELEMENT_KEY)
                    .and_then(|v| v.as_str())
                    .map(str::to_owned);
                Ok(id)
            }
            // "no such element" comes back as a 404 protocol error.
            Err(BrowserError::Protocol(message)) if message.contains("no such element") => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Poll until the element exists and reports itself displayed.
    async fn wait_visible(&self, selector: &str) -> Result<String> {
        let deadline = Instant::now() + self.step_timeout;

        loop {
            if let Some(element) = self.find_element(selector).await? {
                let displayed = self
                    .call(
                        reqwest::Method::GET,
                        &format!("/element/{element}/displayed"),
                        None,
                    )
                    .await?;
                if displayed.as_bool().unwrap_or(false) {
                    return Ok(element);
                }
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::WaitTimeout(
                    self.step_timeout,
                    selector.to_string(),
                ));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn send_keys(&self, element: &str, text: &str) -> Result<()> {
        self.call(
            reqwest::Method::POST,
            &format!("/element/{element}/value"),
            Some(&json!({"text": text})),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, element: &str) -> Result<()> {
        self.call(
            reqwest::Method::POST,
            &format!("/element/{element}/click"),
            Some(&json!({})),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PanelSession for WebDriverSession {
    async fn panel_screenshot(&self, url: &str, panel_id: i64) -> Result<Bytes> {
        debug!(url, panel_id, "Capturing panel screenshot");

        self.navigate(url).await?;
        self.wait_visible(&panel_selector(panel_id)).await?;

        let value = self.call(reqwest::Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| BrowserError::Protocol("screenshot response is not a string".into()))?;

        let image = Base64
            .decode(encoded)
            .map_err(|e| BrowserError::Protocol(format!("screenshot payload: {e}")))?;

        Ok(Bytes::from(image))
    }

    async fn close(&self) {
        if let Err(e) = self.call(reqwest::Method::DELETE, "", None).await {
            warn!(error = %e, "Failed to close webdriver session");
        }
    }
}

/// One WebDriver request. Protocol errors surface the remote `message`
/// field; everything else is transport.
async fn webdriver_call(
    http: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| BrowserError::Transport(e.to_string()))?;

    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;

    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(|e| e.as_str())
            .map(|error| {
                let detail = value.get("message").and_then(|m| m.as_str()).unwrap_or("");
                format!("{error}: {detail}")
            })
            .unwrap_or_else(|| format!("status {}", status.as_u16()));
        return Err(BrowserError::Protocol(message));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_selector_embeds_panel_id() {
        assert_eq!(panel_selector(42), "#panel-42 div.panel-content canvas");
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = BrowserConfig {
            webdriver_url: "http://127.0.0.1:9515/".to_string(),
            ..BrowserConfig::default()
        };
        let browser = WebDriverBrowser::new(&config).unwrap();
        assert_eq!(browser.endpoint, "http://127.0.0.1:9515");
    }
}
