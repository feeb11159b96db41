use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Mime type assumed when a data URL header is absent or unparseable,
/// and the format every processed image is tagged with on the way out.
pub const DEFAULT_MIME: &str = "image/png";

/// A decoded image: raw bytes plus the mime type the data URL claimed.
///
/// Blobs are transient values, created per request and dropped once the
/// response payload has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    mime: String,
    bytes: Vec<u8>,
}

impl ImageBlob {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime: mime.into(), bytes }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Re-tag the blob with a different mime type, keeping the bytes.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not a data URL: no comma between header and payload")]
    MissingSeparator,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decode a `data:<mime>;base64,<payload>` string into an [`ImageBlob`].
///
/// The string is split on the first comma. The mime type is whatever sits
/// between `data:` and the first `;base64` marker; anything else falls back
/// to [`DEFAULT_MIME`]. A payload that is not valid base64 is surfaced as
/// [`CodecError::Base64`], not recovered.
pub fn decode(data_url: &str) -> Result<ImageBlob, CodecError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or(CodecError::MissingSeparator)?;
    let mime = parse_mime(header).unwrap_or(DEFAULT_MIME);
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(ImageBlob::new(mime, bytes))
}

/// Encode an [`ImageBlob`] back into a data URL, honoring the blob's mime
/// type. Callers that need a fixed output format re-tag the blob first via
/// [`ImageBlob::with_mime`].
pub fn encode(blob: &ImageBlob) -> String {
    format!("data:{};base64,{}", blob.mime, STANDARD.encode(&blob.bytes))
}

fn parse_mime(header: &str) -> Option<&str> {
    let rest = header.strip_prefix("data:")?;
    let (mime, _) = rest.split_once(";base64")?;
    if mime.is_empty() { None } else { Some(mime) }
}
