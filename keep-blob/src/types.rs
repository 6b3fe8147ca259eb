use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

use crate::{BlobError, BlobResult};

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// A stream yielding `data` in one chunk.
pub fn bytes_stream(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    Box::pin(futures_util::stream::once(async move { Ok(data) }))
}

/// Drain a stream into memory, failing once it passes `max_bytes`.
pub async fn collect_bytes(mut stream: ByteStream, max_bytes: u64) -> BlobResult<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let size = (buffer.len() + chunk.len()) as u64;
        if size > max_bytes {
            return Err(BlobError::TooLarge {
                size,
                max: max_bytes,
            });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static [u8]]) -> ByteStream {
        let items: Vec<Result<Bytes, std::io::Error>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        Box::pin(futures_util::stream::iter(items))
    }

    #[tokio::test]
    async fn collects_every_chunk() {
        let data = collect_bytes(chunks(&[b"%PDF", b"-1.7"]), 64).await.unwrap();
        assert_eq!(&data[..], b"%PDF-1.7");
    }

    #[tokio::test]
    async fn stops_at_the_ceiling() {
        let err = collect_bytes(chunks(&[b"1234", b"5678"]), 6).await.unwrap_err();
        assert!(matches!(err, BlobError::TooLarge { max: 6, .. }));
    }
}
