use std::collections::BTreeMap;

use eyre::Result;
use serde::{Deserialize, Serialize};

/// The persistable state of an authenticated portal session: the session
/// cookies and the anti-forgery token the portal expects echoed back on
/// every AJAX request.
///
/// Cookies are captured and replayed manually (rather than through an opaque
/// in-process cookie store) so the blob can round-trip through the database
/// and be shared by workers in separate processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBlob {
    pub cookies: BTreeMap<String, String>,
    pub csrf_token: String,
}

impl SessionBlob {
    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Merge cookies from a `Set-Cookie` header value, keeping the latest
    /// value per cookie name.
    pub fn absorb_set_cookie(&mut self, header_value: &str) {
        if let Some(pair) = header_value.split(';').next() {
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_joins_pairs() {
        let mut blob = SessionBlob::default();
        blob.absorb_set_cookie("session_id=abc123; Path=/; HttpOnly");
        blob.absorb_set_cookie("remember=1");

        assert_eq!(blob.cookie_header(), "remember=1; session_id=abc123");
    }

    #[test]
    fn test_absorb_replaces_existing_cookie() {
        let mut blob = SessionBlob::default();
        blob.absorb_set_cookie("session_id=old");
        blob.absorb_set_cookie("session_id=new; Secure");

        assert_eq!(blob.cookies.get("session_id").map(String::as_str), Some("new"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut blob = SessionBlob::default();
        blob.csrf_token = "token123".to_string();
        blob.absorb_set_cookie("session_id=abc");

        let json = blob.to_json().unwrap();
        assert_eq!(SessionBlob::from_json(&json).unwrap(), blob);
    }
}
