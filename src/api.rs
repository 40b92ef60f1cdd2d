// API client module: a small blocking HTTP client that talks to the
// photoapp web service. Each endpoint gets one method returning typed
// records; status handling is shared so every command reports failures
// the same way.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status code and raw body of a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpReply {
            status,
            body: body.into(),
        }
    }
}

/// Moves requests over the wire. The production implementation is
/// `HttpTransport`; tests plug in a scripted one.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpReply>;
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply>;
}

/// `Transport` backed by a reqwest blocking client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpTransport { client })
    }

    /// Send the request while a spinner runs on stderr.
    fn send(&self, request: RequestBuilder, url: &str) -> Result<HttpReply> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Contacting web service...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = request.send().and_then(|res| {
            let status = res.status().as_u16();
            res.text().map(|body| HttpReply { status, body })
        });
        spinner.finish_and_clear();

        result.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply> {
        debug!("GET {url}");
        self.send(self.client.get(url), url)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply> {
        debug!("POST {url}");
        self.send(self.client.post(url).json(body), url)
    }
}

/// A registered user, one row of `GET /users`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub userid: i64,
    pub email: String,
    pub lastname: String,
    pub firstname: String,
    pub bucketfolder: String,
}

/// A stored photo, one row of `GET /assets`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Asset {
    pub assetid: i64,
    pub userid: i64,
    pub assetname: String,
    pub bucketkey: String,
}

/// One object of the bucket listing. Field names follow the object-store
/// listing the service forwards.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct BucketItem {
    pub key: String,
    pub last_modified: String,
    #[serde(rename = "ETag")]
    pub e_tag: String,
    pub size: u64,
    pub storage_class: String,
}

/// Reply of `GET /stats`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Stats {
    pub message: String,
    #[serde(rename = "db_numUsers")]
    pub num_users: i64,
    #[serde(rename = "db_numAssets")]
    pub num_assets: i64,
}

#[derive(Deserialize)]
struct Rows<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Base64 image data as sent by `GET /download/{assetid}`: either a plain
/// string or a single-element array holding the string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Payload {
    Encoded(String),
    Chunks(Vec<String>),
}

impl Payload {
    pub fn decode(&self) -> Result<Vec<u8>> {
        let text = match self {
            Payload::Encoded(text) => text,
            Payload::Chunks(chunks) => chunks
                .first()
                .ok_or_else(|| ClientError::Payload("empty data array".into()))?,
        };
        STANDARD
            .decode(text.trim())
            .map_err(|e| ClientError::Payload(e.to_string()))
    }
}

/// Reply of `GET /download/{assetid}` for an existing asset.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DownloadedAsset {
    pub user_id: i64,
    pub asset_name: String,
    pub bucket_key: String,
    pub data: Payload,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    NotFound,
    Found(DownloadedAsset),
}

/// Body of `POST /image/{userid}`. Geo fields are left out when unknown.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub assetname: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl UploadRequest {
    pub fn new(assetname: impl Into<String>, bytes: &[u8]) -> Self {
        UploadRequest {
            assetname: assetname.into(),
            data: STANDARD.encode(bytes),
            latitude: None,
            longitude: None,
            date_time: None,
        }
    }

    pub fn with_location(mut self, fix: &crate::geo::GpsFix) -> Self {
        self.latitude = Some(fix.latitude);
        self.longitude = Some(fix.longitude);
        self.date_time = fix.date_time.clone();
        self
    }
}

/// Client for the photoapp web service.
pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
}

impl ApiClient<HttpTransport> {
    /// Create a client for the web service named in the configuration.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Ok(ApiClient::new(HttpTransport::new()?, &config.webservice))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        ApiClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        let url = format!("{}/stats", self.base_url);
        let body = self.get(&url)?;
        decode(&url, &body)
    }

    pub fn users(&self) -> Result<Vec<User>> {
        let url = format!("{}/users", self.base_url);
        let body = self.get(&url)?;
        decode::<Rows<User>>(&url, &body).map(|rows| rows.data)
    }

    pub fn assets(&self) -> Result<Vec<Asset>> {
        let url = format!("{}/assets", self.base_url);
        let body = self.get(&url)?;
        decode::<Rows<Asset>>(&url, &body).map(|rows| rows.data)
    }

    /// Fetch an asset's image data. The service answers unknown ids with a
    /// 200 whose message mentions "no such asset".
    pub fn download(&self, assetid: i64) -> Result<DownloadOutcome> {
        let url = format!("{}/download/{}", self.base_url, assetid);
        let body = self.get(&url)?;
        let value: serde_json::Value = decode(&url, &body)?;

        let reply: MessageBody = serde_json::from_value(value.clone())
            .map_err(|source| ClientError::Decode {
                url: url.clone(),
                source,
            })?;
        if reply.message.contains("no such asset") {
            return Ok(DownloadOutcome::NotFound);
        }

        serde_json::from_value(value)
            .map(DownloadOutcome::Found)
            .map_err(|source| ClientError::Decode { url, source })
    }

    /// URL of one bucket page, starting after `start_after` when given.
    pub fn bucket_url(&self, start_after: Option<&str>) -> String {
        match start_after {
            Some(key) => format!(
                "{}/bucket?startafter={}",
                self.base_url,
                urlencoding::encode(key)
            ),
            None => format!("{}/bucket", self.base_url),
        }
    }

    /// One page of the bucket listing. An empty page means the listing is
    /// exhausted.
    pub fn bucket_page(&self, start_after: Option<&str>) -> Result<Vec<BucketItem>> {
        let url = self.bucket_url(start_after);
        let body = self.get(&url)?;
        decode::<Rows<BucketItem>>(&url, &body).map(|rows| rows.data)
    }

    /// Upload an image on behalf of `userid`, returning the service's
    /// confirmation as-is.
    pub fn upload(&self, userid: i64, request: &UploadRequest) -> Result<serde_json::Value> {
        let url = format!("{}/image/{}", self.base_url, userid);
        let body = serde_json::to_value(request).map_err(|source| ClientError::Decode {
            url: url.clone(),
            source,
        })?;
        let reply = self.transport.post_json(&url, &body)?;
        let body = check_status(&url, reply)?;
        decode(&url, &body)
    }

    fn get(&self, url: &str) -> Result<String> {
        let reply = self.transport.get(url)?;
        check_status(url, reply)
    }
}

/// Turn a non-200 reply into an error. 400 replies carry a message body;
/// if that body does not parse the plain status error is returned instead.
fn check_status(url: &str, reply: HttpReply) -> Result<String> {
    match reply.status {
        200 => Ok(reply.body),
        400 => match serde_json::from_str::<MessageBody>(&reply.body) {
            Ok(body) => Err(ClientError::Application {
                status: 400,
                url: url.to_string(),
                message: body.message,
            }),
            Err(_) => Err(ClientError::HttpStatus {
                status: 400,
                url: url.to_string(),
            }),
        },
        status => Err(ClientError::HttpStatus {
            status,
            url: url.to_string(),
        }),
    }
}

fn decode<D: DeserializeOwned>(url: &str, body: &str) -> Result<D> {
    serde_json::from_str(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}
