//! Console rendering for responses and message bodies.

use gems_protocol::Message;
use serde_json::Value as JsonValue;
use std::fmt::Write;

/// One-line header plus the pretty-printed body map.
pub fn render_message(msg: &Message) -> String {
    let header = msg.header();
    let mut out = String::new();
    let _ = write!(
        out,
        "{} | {} | '{}' | {} |",
        msg.kind(),
        header
            .transaction_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        header.token,
        header.target
    );

    let body = msg.body();
    if body.as_object().map(|m| m.is_empty()).unwrap_or(true) {
        return out;
    }
    if let Ok(pretty) = serde_json::to_string_pretty(&body) {
        out.push('\n');
        out.push_str(&pretty);
    }
    out
}

/// Response-focused rendering: the result line, then each content list
/// itemized.
pub fn render_response(msg: &Message) -> String {
    let mut out = msg.kind().to_string();
    let Some(result) = msg.result() else {
        return out;
    };
    let _ = write!(out, ", {result}");

    let Some(body) = msg.body().as_object().cloned() else {
        return out;
    };
    for (key, value) in &body {
        match key.as_str() {
            "result_code" | "result_description" => continue,
            "parameters" | "configurations" | "arguments" | "return_values" => {
                let _ = write!(out, "\n{key}:");
                if let JsonValue::Array(items) = value {
                    for item in items {
                        let rendered = match item {
                            JsonValue::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        let _ = write!(out, "\n  {rendered}");
                    }
                }
            }
            _ => {
                let rendered = match value {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let _ = write!(out, "\n{key}: {rendered}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gems_protocol::{MessageBuilder, MessageKind, ResultCode};

    #[test]
    fn response_rendering_lists_configurations() {
        let msg = MessageBuilder::new()
            .kind(MessageKind::GetConfigListResponse)
            .transaction_id(1)
            .result_code(ResultCode::Success)
            .configuration_list(["ConfigA", "ConfigB"])
            .build()
            .unwrap();
        let rendered = render_response(&msg);
        assert!(rendered.starts_with("GetConfigListResponse, SUCCESS"));
        assert!(rendered.contains("configurations:"));
        assert!(rendered.contains("\n  ConfigA"));
        assert!(rendered.contains("\n  ConfigB"));
    }

    #[test]
    fn request_rendering_shows_header_line() {
        let msg = MessageBuilder::new()
            .kind(MessageKind::Ping)
            .transaction_id(4)
            .target("System/Device1")
            .build()
            .unwrap();
        let rendered = render_message(&msg);
        assert!(rendered.starts_with("PingMessage | 4 | '' | System/Device1 |"));
    }
}
