use chrono::Local;
use serde::Serialize;
use std::fmt;

/// Timestamp layout of `sentAt` on the wire
pub const SENT_AT_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

/// Semantic source of an outbound envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Origin {
    /// Never intended on the wire; flagged when sent
    #[default]
    #[serde(rename = "DEFAULT")]
    Default,
    #[serde(rename = "SERVER")]
    Server,
    /// Chat line from another participant
    #[serde(rename = "USER")]
    User,
    /// Echo of the recipient's own chat line
    #[serde(rename = "SELF")]
    Echo,
    #[serde(rename = "PRIVATE")]
    Private,
}

impl Origin {
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Default => "DEFAULT",
            Origin::Server => "SERVER",
            Origin::User => "USER",
            Origin::Echo => "SELF",
            Origin::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured outbound message, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    body: String,
    origin: Origin,
    sent_at: String,
}

impl Envelope {
    pub fn new(body: impl Into<String>, origin: Origin) -> Self {
        Self {
            body: body.into(),
            origin,
            sent_at: Local::now().format(SENT_AT_FORMAT).to_string(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn sent_at(&self) -> &str {
        &self.sent_at
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&str> for Envelope {
    fn from(body: &str) -> Self {
        Self::new(body, Origin::Default)
    }
}

impl From<String> for Envelope {
    fn from(body: String) -> Self {
        Self::new(body, Origin::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_wire_shape_has_exactly_three_keys() {
        let envelope = Envelope::new("hello", Origin::Server);
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert_eq!(object["body"], "hello");
        assert_eq!(object["origin"], "SERVER");
        assert!(object.contains_key("sentAt"));
    }

    #[test]
    fn test_origin_names() {
        for (origin, name) in [
            (Origin::Default, "DEFAULT"),
            (Origin::Server, "SERVER"),
            (Origin::User, "USER"),
            (Origin::Echo, "SELF"),
            (Origin::Private, "PRIVATE"),
        ] {
            assert_eq!(origin.as_str(), name);
            assert_eq!(serde_json::to_string(&origin).unwrap(), format!("\"{}\"", name));
        }
    }

    #[test]
    fn test_sent_at_format() {
        let envelope = Envelope::new("x", Origin::User);
        assert!(NaiveDateTime::parse_from_str(envelope.sent_at(), SENT_AT_FORMAT).is_ok());
        assert_eq!(envelope.sent_at().len(), "01/02/2024, 13:04:05".len());
    }

    #[test]
    fn test_plain_body_defaults_origin() {
        let envelope = Envelope::from("no origin");
        assert_eq!(envelope.origin(), Origin::Default);
        assert_eq!(envelope.body(), "no origin");
    }
}
