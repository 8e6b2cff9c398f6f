// Pinterest resolver - scrapes the pin page for its embedded state
//
// Pinterest ships the pin's data as JSON inside
// `<script id="__PWS_INITIAL_STATE__">`. We only need one URL from it:
// the 720p (or experimental) video stream, else the original image.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::traits::PageFetcher;
use crate::downloader::errors::ResolutionError;
use crate::downloader::models::DirectMedia;
use crate::downloader::utils::BROWSER_USER_AGENT;

/// Identifier of the script element holding the page state
pub const STATE_SCRIPT_ID: &str = "__PWS_INITIAL_STATE__";

/// Video renditions to try, in order
const VIDEO_KEYS: [&str; 2] = ["V_720P", "V_EXP7"];

lazy_static! {
    static ref STATE_SELECTOR: Selector =
        Selector::parse(&format!("script#{}", STATE_SCRIPT_ID)).unwrap();
}

/// Page fetcher over reqwest
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(proxy: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .connect_timeout(Duration::from_secs(30));

        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ResolutionError> {
        // Short links (pin.it) redirect to the canonical pin page
        let response = self.client.get(url).send().await?;
        debug!(url, final_url = %response.url(), status = %response.status(), "Pin page fetched");
        Ok(response.text().await?)
    }
}

/// Locate the media URL in a pin page
pub fn parse_pin_page(html: &str) -> Result<DirectMedia, ResolutionError> {
    let document = Html::parse_document(html);
    let script = document
        .select(&STATE_SELECTOR)
        .next()
        .ok_or(ResolutionError::MediaNotFound)?;

    let raw: String = script.text().collect();
    let state: Value = serde_json::from_str(&raw)?;

    let pin = state
        .pointer("/resourceResponses/0/response/data")
        .unwrap_or(&Value::Null);

    if let Some(video_list) = pin.pointer("/videos/video_list") {
        let video = VIDEO_KEYS
            .iter()
            .find_map(|key| video_list[*key]["url"].as_str().filter(|url| !url.is_empty()));
        if let Some(url) = video {
            return Ok(DirectMedia::Video(url.to_string()));
        }
    }

    match pin.pointer("/images/orig/url").and_then(Value::as_str) {
        Some(url) if !url.is_empty() => Ok(DirectMedia::Photo(url.to_string())),
        _ => Err(ResolutionError::MediaNotFound),
    }
}
