//! Input shapes accepted by a transform and their normalization.
//!
//! | Variant  | Normalization                                        |
//! |----------|------------------------------------------------------|
//! | `Tree`   | Used as-is, options ignored                          |
//! | `Text`   | Parsed directly                                      |
//! | `Bytes`  | Decoded as UTF-8, then parsed                        |
//! | `Stream` | Drained chunk by chunk, decoded, parsed              |
//! | `Reader` | Read to end, decoded, parsed                         |
//!
//! The parser needs the complete document, so streamed sources are drained
//! before parsing starts.

use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{LocalBoxStream, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{Document, parse};
use crate::config::TransformOptions;
use crate::error::TransformError;

/// One transform input.
pub enum Input {
    /// An already-parsed document.
    Tree(Document),
    /// Raw HTML text.
    Text(String),
    /// Raw HTML bytes (UTF-8).
    Bytes(Bytes),
    /// Chunked byte source.
    Stream(LocalBoxStream<'static, io::Result<Bytes>>),
    /// Async byte reader.
    Reader(Pin<Box<dyn AsyncRead>>),
}

impl Input {
    /// Box a chunk stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + 'static,
    {
        Self::Stream(stream.boxed_local())
    }

    /// Box an async reader.
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + 'static,
    {
        Self::Reader(Box::pin(reader))
    }

    /// Normalize this input into a document.
    ///
    /// Consumes stream and reader sources.
    pub async fn into_document(self, options: &TransformOptions) -> Result<Document, TransformError> {
        match self {
            Self::Tree(document) => Ok(document),
            Self::Text(text) => Document::parse(&text, options),
            Self::Bytes(bytes) => Document::parse(parse::decode(&bytes)?, options),
            Self::Stream(stream) => {
                let buffer = drain_stream(stream).await?;
                Document::parse(parse::decode(&buffer)?, options)
            }
            Self::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(TransformError::Stream)?;
                crate::debug!("parse"; "read {} bytes from reader", buffer.len());
                Document::parse(parse::decode(&buffer)?, options)
            }
        }
    }
}

/// Concatenate every chunk in arrival order.
async fn drain_stream(
    mut stream: LocalBoxStream<'static, io::Result<Bytes>>,
) -> Result<Vec<u8>, TransformError> {
    let mut buffer = Vec::new();
    let mut chunks = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(TransformError::Stream)?;
        buffer.extend_from_slice(&chunk);
        chunks += 1;
    }

    crate::debug!("parse"; "drained {} chunks ({} bytes)", chunks, buffer.len());
    Ok(buffer)
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(document) => f.debug_tuple("Tree").field(document).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<Document> for Input {
    fn from(document: Document) -> Self {
        Self::Tree(document)
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Input {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Input {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}
