use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::domain::{TVConfig, TVError};
use crate::record::Record;

pub const MISSING_ID: &str = "---";

/// What a source answered, short of a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResponse {
    Records(Vec<Record>),
    /// The source replied with an explicit error message.
    Error(String),
}

pub trait DataSource: Send + Sync {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<SourceResponse, TVError>;
    /// Networked sources are refetched when the user asks for the page slice again.
    fn is_networked(&self) -> bool;
}

// -------------------- Payload ---------------------- //

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Error { error: String },
    Results { results: Vec<ApiUser> },
    Flat(Vec<Record>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiUser {
    gender: String,
    name: ApiName,
    email: String,
    login: Option<ApiLogin>,
    dob: ApiDob,
    picture: Option<ApiPicture>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiName {
    title: String,
    first: String,
    last: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiLogin {
    uuid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiDob {
    date: String,
    age: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPicture {
    thumbnail: Option<String>,
}

impl ApiUser {
    fn into_record(self) -> Record {
        let id = self
            .login
            .and_then(|l| l.uuid)
            .and_then(|uuid| uuid.split('-').next().map(str::to_string))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| MISSING_ID.to_string());
        let name = [self.name.title, self.name.first, self.name.last]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>()
            .join(" ");

        Record {
            id,
            name,
            age: self.dob.age,
            gender: self.gender,
            email: self.email,
            date: self.dob.date,
            thumbnail: self.picture.and_then(|p| p.thumbnail),
        }
    }
}

pub fn parse_payload(body: &str) -> Result<SourceResponse, TVError> {
    let response = match serde_json::from_str::<Payload>(body)? {
        Payload::Error { error } => SourceResponse::Error(error),
        Payload::Results { results } => {
            SourceResponse::Records(results.into_iter().map(ApiUser::into_record).collect())
        }
        Payload::Flat(records) => SourceResponse::Records(records),
    };
    Ok(response)
}

// -------------------- Sources ---------------------- //

pub struct HttpSource {
    client: reqwest::blocking::Client,
    url: String,
    results: usize,
}

impl HttpSource {
    pub fn new(config: &TVConfig) -> Result<Self, TVError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.source_url.clone(),
            results: config.results,
        })
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        format!("{}?results={}", self.url, self.results)
    }

    fn fetch(&self) -> Result<SourceResponse, TVError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("results", self.results)])
            .send()?;
        let status = response.status();
        let body = response.text()?;
        // Error payloads may come with a failing status, so try the body first.
        parse_payload(&body).inspect_err(|e| {
            if !status.is_success() {
                warn!("Source answered {status} with unreadable body: {e}");
            }
        })
    }

    fn is_networked(&self) -> bool {
        true
    }
}

/// Reads the dataset from a local json file.
pub struct FixtureSource {
    path: PathBuf,
    results: usize,
}

impl FixtureSource {
    pub fn new(path: PathBuf, results: usize) -> Self {
        Self { path, results }
    }
}

impl DataSource for FixtureSource {
    fn describe(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn fetch(&self) -> Result<SourceResponse, TVError> {
        let body = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TVError::FileNotFound,
            ErrorKind::PermissionDenied => TVError::PermissionDenied,
            _ => TVError::IoError(e),
        })?;
        Ok(match parse_payload(&body)? {
            SourceResponse::Records(mut records) => {
                records.truncate(self.results);
                SourceResponse::Records(records)
            }
            other => other,
        })
    }

    fn is_networked(&self) -> bool {
        false
    }
}

pub fn source_from_config(config: &TVConfig) -> Result<Arc<dyn DataSource>, TVError> {
    Ok(match &config.fixture {
        Some(path) => Arc::new(FixtureSource::new(path.clone(), config.results)),
        None => Arc::new(HttpSource::new(config)?),
    })
}

// -------------------- Background fetching ---------------------- //

#[derive(Debug)]
pub struct FetchResult {
    pub request: u64,
    pub outcome: Result<SourceResponse, TVError>,
}

/// Runs each fetch on its own worker thread and hands results back through a channel.
///
/// Requests cannot be canceled. Results are delivered in completion order,
/// which is not necessarily the order they were issued in.
pub struct Fetcher {
    source: Arc<dyn DataSource>,
    tx: Sender<FetchResult>,
    rx: Receiver<FetchResult>,
    next_request: u64,
    in_flight: usize,
}

impl Fetcher {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            next_request: 1,
            in_flight: 0,
        }
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn request(&mut self) -> Result<u64, TVError> {
        let request = self.next_request;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        std::thread::Builder::new()
            .name(format!("fetch-{request}"))
            .spawn(move || {
                let start_time = Instant::now();
                debug!("Request #{request}: fetching {}", source.describe());
                let outcome = source.fetch();
                let duration = start_time.elapsed().as_millis();
                match &outcome {
                    Ok(SourceResponse::Records(records)) => {
                        info!("Request #{request}: {} records in {duration}ms", records.len())
                    }
                    Ok(SourceResponse::Error(message)) => {
                        warn!("Request #{request}: source error \"{message}\"")
                    }
                    Err(e) => error!("Request #{request}: failed after {duration}ms: {e}"),
                }
                // The receiver is gone when the app is shutting down
                let _ = tx.send(FetchResult { request, outcome });
            })?;

        self.next_request += 1;
        self.in_flight += 1;
        Ok(request)
    }

    pub fn poll(&mut self) -> Option<FetchResult> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
