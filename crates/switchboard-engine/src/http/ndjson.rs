// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newline-delimited JSON framing over a response body.

use futures::stream::{self, Stream, StreamExt};

/// Splits a response body into trimmed, non-empty lines.
///
/// A final line without a trailing newline is still yielded. A transport
/// error is yielded once and ends the stream.
pub(crate) fn lines(response: reqwest::Response) -> impl Stream<Item = Result<String, reqwest::Error>> + Send {
    let bytes = Box::pin(response.bytes_stream());
    stream::unfold((bytes, Vec::new(), false), |(mut bytes, mut buf, mut done)| async move {
        loop {
            if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line).trim().to_string();
                if text.is_empty() {
                    continue;
                }
                return Some((Ok(text), (bytes, buf, done)));
            }
            if done {
                let text = String::from_utf8_lossy(&buf).trim().to_string();
                buf.clear();
                return (!text.is_empty()).then_some((Ok(text), (bytes, buf, done)));
            }
            match bytes.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    buf.clear();
                    return Some((Err(e), (bytes, buf, true)));
                }
                None => done = true,
            }
        }
    })
}
