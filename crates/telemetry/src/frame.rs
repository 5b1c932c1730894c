use serde_json::Value;

/// One inbound WebSocket message.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFrame {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    InvalidUtf8(String),
    InvalidJson(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::InvalidUtf8(msg) => write!(f, "feed frame is not UTF-8: {msg}"),
            FeedError::InvalidJson(msg) => write!(f, "feed frame is not JSON: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {}

impl FeedFrame {
    pub fn into_text(self) -> Result<String, FeedError> {
        match self {
            FeedFrame::Text(text) => Ok(text),
            FeedFrame::Binary(bytes) => {
                String::from_utf8(bytes).map_err(|e| FeedError::InvalidUtf8(e.to_string()))
            }
        }
    }

    pub fn decode(self) -> Result<Value, FeedError> {
        let text = self.into_text()?;
        serde_json::from_str(&text).map_err(|e| FeedError::InvalidJson(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedError, FeedFrame};
    use serde_json::json;

    #[test]
    fn text_and_binary_decode_alike() {
        let raw = r#"[0,32]"#;
        let a = FeedFrame::Text(raw.to_string()).decode().expect("text");
        let b = FeedFrame::Binary(raw.as_bytes().to_vec()).decode().expect("binary");
        assert_eq!(a, json!([0, 32]));
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = FeedFrame::Text("[1,".to_string()).decode().unwrap_err();
        assert!(matches!(err, FeedError::InvalidJson(_)));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let err = FeedFrame::Binary(vec![0xff, 0xfe]).decode().unwrap_err();
        assert!(matches!(err, FeedError::InvalidUtf8(_)));
    }
}
