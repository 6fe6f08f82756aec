//! Boundary to the external screen/transition analysis service
//!
//! The service receives the ordered keyframes and answers with the screens it
//! recognised and the transitions between them. It is treated as an opaque,
//! possibly failing call: errors are surfaced whole and never retried here.

use crate::{CapturedFrame, Error, Result, SitemapGraph};
use serde::{Deserialize, Serialize};

/// A single keyframe as sent to the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFrame {
    /// Position of the frame in the captured sequence
    pub index: usize,
    /// Timestamp in seconds
    pub time: f64,
    /// Image as a `data:` URL
    pub image: String,
}

/// Ordered keyframes sent to the analysis service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub frames: Vec<AnalysisFrame>,
}

impl AnalysisRequest {
    /// Builds a request from the captured frame sequence, preserving order
    pub fn from_frames(frames: &[CapturedFrame]) -> Self {
        let frames = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| AnalysisFrame {
                index,
                time: frame.time,
                image: format!(
                    "data:{};base64,{}",
                    frame.encoding.mime_type(),
                    base64_encode(&frame.data)
                ),
            })
            .collect();
        Self { frames }
    }

    /// Number of frames in the request
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Checks if the request carries no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Infers screens and transitions from an ordered set of keyframes
pub trait AnalysisService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<SitemapGraph>;
}

/// Parses and validates a raw analysis response.
///
/// `frame_count` is the number of frames in the originating request; every
/// screen's `frameIndex` must point inside it.
pub fn parse_response(raw: &[u8], frame_count: usize) -> Result<SitemapGraph> {
    let graph: SitemapGraph = serde_json::from_slice(raw)
        .map_err(|e| Error::AnalysisService(format!("malformed response: {e}")))?;
    validate_response(&graph, frame_count)?;
    Ok(graph)
}

fn validate_response(graph: &SitemapGraph, frame_count: usize) -> Result<()> {
    for node in &graph.nodes {
        if node.id.is_empty() {
            return Err(Error::AnalysisService("screen with empty id".into()));
        }
        if node.frame_index >= frame_count {
            return Err(Error::AnalysisService(format!(
                "screen '{}' references frame {} but only {} frames were sent",
                node.id, node.frame_index, frame_count
            )));
        }
    }
    Ok(())
}

/// Standard base64 with padding
fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let combined = (b0 << 16) | (b1 << 8) | b2;

        out.push(ALPHABET[(combined >> 18) as usize & 0x3F] as char);
        out.push(ALPHABET[(combined >> 12) as usize & 0x3F] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(combined >> 6) as usize & 0x3F] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[combined as usize & 0x3F] as char
        } else {
            '='
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageEncoding;

    #[test]
    fn test_base64_encode() {
        assert_eq!(base64_encode(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(base64_encode(b"ab"), "YWI=");
        assert_eq!(base64_encode(b""), "");
    }

    #[test]
    fn test_request_preserves_order_and_index() {
        let frames = vec![
            CapturedFrame::new(0.0, 2, 2, ImageEncoding::Png, vec![1, 2, 3]),
            CapturedFrame::new(4.0, 2, 2, ImageEncoding::Jpeg, vec![4]),
        ];
        let request = AnalysisRequest::from_frames(&frames);

        assert_eq!(request.len(), 2);
        assert_eq!(request.frames[1].index, 1);
        assert_eq!(request.frames[1].time, 4.0);
        assert_eq!(request.frames[0].image, "data:image/png;base64,AQID");
        assert!(request.frames[1].image.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_parse_response() {
        let raw = br#"{
            "screens": [
                {"id": "login", "label": "Login", "description": "", "frameIndex": 0},
                {"id": "home", "label": "Home", "description": "", "frameIndex": 1}
            ],
            "edges": [{"fromId": "login", "toId": "home", "label": "Sign in"}]
        }"#;
        let graph = parse_response(raw, 2).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges[0].label, "Sign in");
    }

    #[test]
    fn test_parse_response_rejects_malformed_json() {
        let err = parse_response(b"not json", 1).unwrap_err();
        assert!(matches!(err, Error::AnalysisService(_)));
    }

    #[test]
    fn test_parse_response_rejects_out_of_range_frame() {
        let raw = br#"{"screens": [{"id": "a", "label": "A", "frameIndex": 5}], "edges": []}"#;
        let err = parse_response(raw, 2).unwrap_err();
        assert!(err.to_string().contains("frame 5"));
    }

    #[test]
    fn test_parse_response_rejects_empty_id() {
        let raw = br#"{"screens": [{"id": "", "label": "A", "frameIndex": 0}]}"#;
        assert!(parse_response(raw, 1).is_err());
    }
}
