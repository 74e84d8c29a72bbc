//! TwiML voice response rendering
//!
//! Builds the small subset of TwiML the voice webhook answers with:
//! `<Say>`, `<Pause>` and `<Connect><Stream>`. Rendered by hand; the
//! format is stable and tiny.

/// Verbs in answer order
#[derive(Clone, Debug)]
enum Verb {
    Say {
        text: String,
        voice: String,
        language: String,
    },
    Pause {
        length: u32,
    },
    ConnectStream {
        url: String,
        status_callback: String,
        status_callback_method: String,
    },
}

/// A TwiML `<Response>` document
#[derive(Clone, Debug, Default)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `<Say>` verb
    pub fn say(mut self, text: &str, voice: &str, language: &str) -> Self {
        self.verbs.push(Verb::Say {
            text: text.to_string(),
            voice: voice.to_string(),
            language: language.to_string(),
        });
        self
    }

    /// Append a `<Pause>` verb
    pub fn pause(mut self, length: u32) -> Self {
        self.verbs.push(Verb::Pause { length });
        self
    }

    /// Append a `<Connect><Stream>` verb pointing the call's media at a
    /// WebSocket endpoint, with a lifecycle status callback.
    pub fn connect_stream(mut self, url: &str, status_callback: &str, method: &str) -> Self {
        self.verbs.push(Verb::ConnectStream {
            url: url.to_string(),
            status_callback: status_callback.to_string(),
            status_callback_method: method.to_string(),
        });
        self
    }

    /// Render the document as XML
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);

        for verb in &self.verbs {
            match verb {
                Verb::Say {
                    text,
                    voice,
                    language,
                } => {
                    xml.push_str(&format!(
                        r#"<Say voice="{}" language="{}">{}</Say>"#,
                        escape(voice),
                        escape(language),
                        escape(text)
                    ));
                }
                Verb::Pause { length } => {
                    xml.push_str(&format!(r#"<Pause length="{length}"/>"#));
                }
                Verb::ConnectStream {
                    url,
                    status_callback,
                    status_callback_method,
                } => {
                    xml.push_str(&format!(
                        r#"<Connect><Stream url="{}" statusCallback="{}" statusCallbackMethod="{}"/></Connect>"#,
                        escape(url),
                        escape(status_callback),
                        escape(status_callback_method)
                    ));
                }
            }
        }

        xml.push_str("</Response>");
        xml
    }
}

/// Escape text for XML element and attribute content
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a & b <c>"), "a &amp; b &lt;c&gt;");
        assert_eq!(escape(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn test_render_full_response() {
        let xml = VoiceResponse::new()
            .say("Welcome.", "alice", "en-US")
            .pause(1)
            .say("Start talking.", "alice", "en-US")
            .connect_stream(
                "wss://bridge.example.com/media-stream",
                "https://bridge.example.com/stream-status",
                "POST",
            )
            .to_xml();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#));
        assert!(xml.contains(r#"<Say voice="alice" language="en-US">Welcome.</Say>"#));
        assert!(xml.contains(r#"<Pause length="1"/>"#));
        assert!(xml.contains(
            r#"<Connect><Stream url="wss://bridge.example.com/media-stream" statusCallback="https://bridge.example.com/stream-status" statusCallbackMethod="POST"/></Connect>"#
        ));
        assert!(xml.ends_with("</Response>"));
    }

    #[test]
    fn test_empty_response() {
        let xml = VoiceResponse::new().to_xml();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#
        );
    }
}
