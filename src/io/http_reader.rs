use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{header::RANGE, Client, StatusCode};

use super::range_reader::prefix_range;
use super::RangeReader;
use crate::error::IoError;

/// HTTP(S)-backed implementation of RangeReader.
///
/// Issues a single `GET` with a `Range` header. Servers that ignore the range
/// and answer `200 OK` with the full body are handled by streaming chunks and
/// stopping once `len` bytes have arrived, so a large file is never
/// downloaded in full.
#[derive(Clone)]
pub struct HttpRangeReader {
    client: Client,
    url: String,
}

impl HttpRangeReader {
    /// Create a reader for the given URL using a shared client.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RangeReader for HttpRangeReader {
    async fn read_prefix(&self, len: usize) -> Result<Bytes, IoError> {
        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut resp = self
            .client
            .get(&self.url)
            .header(RANGE, prefix_range(len))
            .send()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(IoError::NotFound(self.url.clone()));
        }
        if !status.is_success() {
            return Err(IoError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let mut buf = BytesMut::with_capacity(len);
        while buf.len() < len {
            match resp
                .chunk()
                .await
                .map_err(|e| IoError::Connection(e.to_string()))?
            {
                Some(chunk) => buf.extend_from_slice(&chunk),
                None => break,
            }
        }
        buf.truncate(len);

        Ok(buf.freeze())
    }

    fn identifier(&self) -> &str {
        &self.url
    }
}
