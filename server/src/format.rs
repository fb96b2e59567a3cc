//! Content negotiation: picks the response format from `Accept` and decodes
//! request bodies according to `Content-Type`.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// Format with the highest weight in an `Accept` value. Each format takes
    /// the `q` of the most specific range matching it; `q=0` excludes it and
    /// ties go to JSON. `None` when nothing acceptable remains.
    pub fn from_accept(accept: &str) -> Option<Self> {
        if accept.trim().is_empty() {
            return Some(Format::Json);
        }
        let ranges = accept
            .split(',')
            .map(|range| (essence(range), quality(range)))
            .collect::<Vec<_>>();
        [Format::Json, Format::Xml]
            .into_iter()
            .filter_map(|format| {
                ranges
                    .iter()
                    .filter_map(|(media, q)| format.specificity(media).map(|s| (s, *q)))
                    .max_by_key(|(specificity, _)| *specificity)
                    .map(|(_, q)| (format, q))
            })
            .filter(|(_, q)| *q > 0.0)
            .fold(None, |best: Option<(Format, f32)>, (format, q)| match best {
                Some((_, top)) if top >= q => best,
                _ => Some((format, q)),
            })
            .map(|(format, _)| format)
    }

    fn media_types(&self) -> &'static [&'static str] {
        match self {
            Format::Json => &["application/json"],
            Format::Xml => &["application/xml", "text/xml"],
        }
    }

    /// How precisely `range` names this format: 2 for a full type, 1 for
    /// `type/*`, 0 for `*/*`.
    fn specificity(&self, range: &str) -> Option<u8> {
        let suffix = match self {
            Format::Json => "+json",
            Format::Xml => "+xml",
        };
        if self.media_types().iter().any(|media| *media == range) || range.ends_with(suffix) {
            return Some(2);
        }
        if range == "*/*" {
            return Some(0);
        }
        let main = range.strip_suffix("/*")?;
        self.media_types()
            .iter()
            .any(|media| media.split('/').next() == Some(main))
            .then_some(1)
    }

    fn from_content_type(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        match essence(content_type).as_str() {
            "application/json" => Some(Format::Json),
            "application/xml" | "text/xml" => Some(Format::Xml),
            media if media.ends_with("+json") => Some(Format::Json),
            media if media.ends_with("+xml") => Some(Format::Xml),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }
}

fn quality(range: &str) -> f32 {
    range
        .split(';')
        .skip(1)
        .find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("q")
                .then(|| value.trim().parse::<f32>().ok())
                .flatten()
        })
        .unwrap_or(1.0)
}

fn essence(media: &str) -> String {
    media
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Format
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let Some(accept) = parts.headers.get(ACCEPT) else {
            return Ok(Format::Json);
        };
        accept
            .to_str()
            .ok()
            .and_then(Format::from_accept)
            .ok_or_else(|| {
                (
                    StatusCode::NOT_ACCEPTABLE,
                    "Responses are available as application/json or application/xml.",
                )
                    .into_response()
            })
    }
}

/// Repeated `<item>` children of a collection document.
#[derive(Serialize, Deserialize)]
struct Items<C> {
    #[serde(default)]
    item: C,
}

async fn read_body<S>(req: Request, state: &S, json_only: bool) -> Result<(Format, Bytes), Response>
where
    S: Send + Sync,
{
    let format = Format::from_content_type(req.headers());
    let bytes = Bytes::from_request(req, state)
        .await
        .map_err(IntoResponse::into_response)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err((StatusCode::BAD_REQUEST, "A request body is required.").into_response());
    }
    match format {
        Some(Format::Json) => Ok((Format::Json, bytes)),
        Some(Format::Xml) if !json_only => Ok((Format::Xml, bytes)),
        _ => Err(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response()),
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(bytes).map_err(malformed)
}

fn decode_xml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Response> {
    let text = std::str::from_utf8(bytes).map_err(malformed)?;
    quick_xml::de::from_str(text).map_err(malformed)
}

fn malformed(error: impl std::fmt::Display) -> Response {
    tracing::debug!("rejected request body: {error}");
    (StatusCode::BAD_REQUEST, format!("The request body is malformed: {error}")).into_response()
}

/// A single representation sent as JSON or XML.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (format, bytes) = read_body(req, state, false).await?;
        match format {
            Format::Json => decode(&bytes).map(Payload),
            Format::Xml => decode_xml(&bytes).map(Payload),
        }
    }
}

/// A sequence of representations: a JSON array, or `<item>` elements under
/// any XML root.
pub struct PayloadList<T>(pub Vec<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for PayloadList<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (format, bytes) = read_body(req, state, false).await?;
        match format {
            Format::Json => decode(&bytes).map(PayloadList),
            Format::Xml => decode_xml::<Items<Vec<T>>>(&bytes).map(|items| PayloadList(items.item)),
        }
    }
}

/// Bodies that only have a JSON form, such as patch documents.
pub struct JsonPayload<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (_, bytes) = read_body(req, state, true).await?;
        decode(&bytes).map(JsonPayload)
    }
}

enum Shape<T> {
    One(T),
    Many(Vec<T>),
}

/// A response body rendered in the negotiated format.
pub struct Represented<T> {
    status: StatusCode,
    format: Format,
    root: &'static str,
    location: Option<String>,
    shape: Shape<T>,
}

impl<T> Represented<T> {
    pub fn one(format: Format, root: &'static str, body: T) -> Self {
        Self {
            status: StatusCode::OK,
            format,
            root,
            location: None,
            shape: Shape::One(body),
        }
    }

    pub fn many(format: Format, root: &'static str, body: Vec<T>) -> Self {
        Self {
            status: StatusCode::OK,
            format,
            root,
            location: None,
            shape: Shape::Many(body),
        }
    }

    pub fn created(mut self, location: impl Into<String>) -> Self {
        self.status = StatusCode::CREATED;
        self.location = Some(location.into());
        self
    }
}

impl<T: Serialize> Represented<T> {
    fn render(&self) -> Result<Vec<u8>, String> {
        match (&self.format, &self.shape) {
            (Format::Json, Shape::One(body)) => {
                serde_json::to_vec(body).map_err(|e| e.to_string())
            }
            (Format::Json, Shape::Many(body)) => {
                serde_json::to_vec(body).map_err(|e| e.to_string())
            }
            (Format::Xml, Shape::One(body)) => quick_xml::se::to_string_with_root(self.root, body)
                .map(String::into_bytes)
                .map_err(|e| e.to_string()),
            (Format::Xml, Shape::Many(body)) => {
                let items = Items {
                    item: body.as_slice(),
                };
                quick_xml::se::to_string_with_root(self.root, &items)
                    .map(String::into_bytes)
                    .map_err(|e| e.to_string())
            }
        }
    }
}

impl<T: Serialize> IntoResponse for Represented<T> {
    fn into_response(self) -> Response {
        let body = match self.render() {
            Ok(body) => body,
            Err(error) => {
                tracing::error!("failed to render {}: {error}", self.root);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        let mut response = (
            self.status,
            [(CONTENT_TYPE, self.format.content_type())],
            body,
        )
            .into_response();
        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(location) => {
                    response.headers_mut().insert(LOCATION, location);
                }
                Err(error) => tracing::warn!("dropped location {location}: {error}"),
            }
        }
        response
    }
}
