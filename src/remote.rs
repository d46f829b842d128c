use std::fmt;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

/// The ANU quantum random number service. Each request returns up to
/// [`MAX_BATCH_LEN`] `u16` values measured from vacuum fluctuations.
/// API doc: <https://qrng.anu.edu.au/API/api-demo.php>
pub const ANU_ENDPOINT: &str = "https://qrng.anu.edu.au/API/jsonI.php";

/// The largest batch the service hands out per request.
pub const MAX_BATCH_LEN: usize = 1024;

/// Default network timeout, after which a fetch fails and the hybrid
/// generator falls back to local draws.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7);

/// A source of remotely generated random `u16` values.
///
/// One `fetch` is one network round-trip; retries are the caller's business.
/// The hybrid generator is generic over this trait, so tests can script a
/// source and the CLI can swap in [`NullSource`] to stay offline.
pub trait RemoteSource {
    /// Fetches up to `count` raw values. Any failure is returned as a
    /// [`FetchError`]; implementations must not retry internally.
    fn fetch(&self, count: usize) -> Result<Vec<u16>, FetchError>;
}

/// Why a remote fetch produced no values. All variants are transient: the
/// hybrid generator absorbs them and substitutes local draws.
#[derive(Debug)]
pub enum FetchError {
    /// The request failed: connect error, timeout, or a non-success status.
    Http(Box<ureq::Error>),
    /// The response body could not be read.
    Io(std::io::Error),
    /// The response arrived but did not decode to a batch of values.
    Malformed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "request failed: {err}"),
            FetchError::Io(err) => write!(f, "failed to read response: {err}"),
            FetchError::Malformed(what) => write!(f, "malformed response: {what}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            FetchError::Io(err) => Some(err),
            FetchError::Malformed(_) => None,
        }
    }
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err)
    }
}

/// A client for the ANU quantum random number service.
pub struct AnuClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl AnuClient {
    /// Returns a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }
}

impl Default for AnuClient {
    fn default() -> Self {
        Self::new(ANU_ENDPOINT, DEFAULT_TIMEOUT)
    }
}

impl RemoteSource for AnuClient {
    fn fetch(&self, count: usize) -> Result<Vec<u16>, FetchError> {
        let count = count.clamp(1, MAX_BATCH_LEN);
        let url = format!("{}?length={}&type=uint16", self.endpoint, count);
        debug!("fetching {count} values from {}", self.endpoint);
        let body = self.agent.get(&url).call()?.into_string()?;
        parse_response(&body)
    }
}

/// A remote source that is always down. Forces the hybrid generator into
/// pure local operation; used by the CLI `--offline` flag.
pub struct NullSource;

impl RemoteSource for NullSource {
    fn fetch(&self, _count: usize) -> Result<Vec<u16>, FetchError> {
        Err(FetchError::Malformed("remote source disabled".into()))
    }
}

/// One element of the `data` array. The service returns plain integers for
/// `type=uint16` and hex digit strings for `type=hex16`; tolerate both.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Int(u16),
    Hex(String),
}

/// The JSON envelope the service wraps batches in. For `length=3` it looks
/// like `{"type":"uint16","length":3,"data":[7731,40732,1971],"success":true}`.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<RawValue>,
}

/// Decodes a response body into a batch of raw values. Fails closed on
/// anything unexpected; the generator treats that the same as a network
/// failure.
pub(crate) fn parse_response(body: &str) -> Result<Vec<u16>, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|err| FetchError::Malformed(err.to_string()))?;
    if !envelope.success {
        return Err(FetchError::Malformed("service reported success=false".into()));
    }
    if envelope.data.is_empty() {
        return Err(FetchError::Malformed("empty batch".into()));
    }
    envelope
        .data
        .into_iter()
        .map(|value| match value {
            RawValue::Int(x) => Ok(x),
            RawValue::Hex(s) => u16::from_str_radix(&s, 16)
                .map_err(|_| FetchError::Malformed(format!("bad hex value {s:?}"))),
        })
        .collect()
}
