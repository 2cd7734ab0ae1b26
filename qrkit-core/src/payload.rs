//! Canonical payload model - the flat representation consumed by the encoder.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The encoding scheme of a canonical payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Plain URL, emitted verbatim.
    Url,
    /// vCard 3.0 contact card.
    Vcard,
    /// Plain text, emitted verbatim.
    Text,
    /// `sms:` URI.
    Sms,
    /// `mailto:` URI.
    Email,
    /// `WIFI:` network configuration string.
    Wifi,
    /// `tel:` URI.
    Phone,
    /// `geo:` URI.
    Location,
}

impl PayloadKind {
    /// Every payload kind, in display order.
    pub const ALL: [Self; 8] = [
        Self::Url,
        Self::Vcard,
        Self::Text,
        Self::Sms,
        Self::Email,
        Self::Wifi,
        Self::Phone,
        Self::Location,
    ];

    /// Wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Vcard => "vcard",
            Self::Text => "text",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Wifi => "wifi",
            Self::Phone => "phone",
            Self::Location => "location",
        }
    }

    /// Canonical field keys that may appear in a payload of this kind.
    #[must_use]
    pub const fn field_keys(self) -> &'static [&'static str] {
        match self {
            Self::Url => &["url"],
            Self::Vcard => &["name", "org", "title", "phone", "email", "website", "address"],
            Self::Text => &["text"],
            Self::Sms => &["phone", "message"],
            Self::Email => &["email", "subject", "message"],
            Self::Wifi => &["ssid", "password", "encryption", "hidden"],
            Self::Phone => &["phone"],
            Self::Location => &["latitude", "longitude", "label"],
        }
    }

    /// Whether `key` is a canonical field of this kind.
    #[must_use]
    pub fn accepts(self, key: &str) -> bool {
        self.field_keys().contains(&key)
    }

    /// The form kind that edits payloads of this kind.
    #[must_use]
    pub const fn form_kind(self) -> FormKind {
        match self {
            Self::Url => FormKind::Url,
            Self::Vcard => FormKind::Contact,
            Self::Text => FormKind::Text,
            Self::Sms => FormKind::Sms,
            Self::Email => FormKind::Email,
            Self::Wifi => FormKind::Wifi,
            Self::Phone => FormKind::Phone,
            Self::Location => FormKind::Location,
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownKind(s.to_string()))
    }
}

/// The kind selected in the editing UI.
///
/// Identical to [`PayloadKind`] except that contacts are called `contact`
/// here and `vcard` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    /// Website URL.
    #[default]
    Url,
    /// Contact card.
    Contact,
    /// Plain text.
    Text,
    /// SMS message.
    Sms,
    /// Email.
    Email,
    /// WiFi network.
    Wifi,
    /// Phone number.
    Phone,
    /// GPS location.
    Location,
}

impl FormKind {
    /// Every form kind, in display order.
    pub const ALL: [Self; 8] = [
        Self::Url,
        Self::Contact,
        Self::Text,
        Self::Sms,
        Self::Email,
        Self::Wifi,
        Self::Phone,
        Self::Location,
    ];

    /// Name of this kind as used by the UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Contact => "contact",
            Self::Text => "text",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Wifi => "wifi",
            Self::Phone => "phone",
            Self::Location => "location",
        }
    }

    /// Human readable label for kind pickers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Url => "Website URL",
            Self::Contact => "Contact Card",
            Self::Text => "Plain Text",
            Self::Sms => "SMS Message",
            Self::Email => "Email",
            Self::Wifi => "WiFi Network",
            Self::Phone => "Phone Number",
            Self::Location => "GPS Location",
        }
    }

    /// The canonical payload kind produced for this form kind.
    #[must_use]
    pub const fn payload_kind(self) -> PayloadKind {
        match self {
            Self::Url => PayloadKind::Url,
            Self::Contact => PayloadKind::Vcard,
            Self::Text => PayloadKind::Text,
            Self::Sms => PayloadKind::Sms,
            Self::Email => PayloadKind::Email,
            Self::Wifi => PayloadKind::Wifi,
            Self::Phone => PayloadKind::Phone,
            Self::Location => PayloadKind::Location,
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownKind(s.to_string()))
    }
}

/// Serialized shape of a payload: `{ "type": ..., "data": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadDocument {
    /// Payload kind.
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    /// Raw field map, possibly holding keys the kind does not use.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// A typed payload with scheme-specific string fields.
///
/// Only keys listed by [`PayloadKind::field_keys`] are ever stored. Missing
/// keys read as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PayloadDocument", into = "PayloadDocument")]
pub struct CanonicalPayload {
    kind: PayloadKind,
    fields: BTreeMap<String, String>,
}

impl CanonicalPayload {
    /// Create an empty payload of the given kind.
    #[must_use]
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Create a payload from arbitrary key/value pairs, dropping keys that
    /// do not belong to `kind`.
    #[must_use]
    pub fn from_fields<I, K, V>(kind: PayloadKind, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        fields
            .into_iter()
            .fold(Self::new(kind), |payload, (k, v)| payload.with_field(k, v))
    }

    /// Set a field, ignoring keys that do not belong to this kind.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if self.kind.accepts(&key) {
            self.fields.insert(key, value.into());
        } else {
            tracing::debug!("Dropping field {key:?} not used by {} payloads", self.kind);
        }
        self
    }

    /// The payload kind.
    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Read a field; absent keys read as `""`.
    #[must_use]
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map_or("", String::as_str)
    }

    /// Iterate over the stored fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<PayloadDocument> for CanonicalPayload {
    fn from(doc: PayloadDocument) -> Self {
        Self::from_fields(doc.kind, doc.data)
    }
}

impl From<CanonicalPayload> for PayloadDocument {
    fn from(payload: CanonicalPayload) -> Self {
        Self {
            kind: payload.kind,
            data: payload.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irrelevant_keys_are_dropped() {
        let payload = CanonicalPayload::new(PayloadKind::Url)
            .with_field("url", "https://example.com")
            .with_field("ssid", "home");

        assert_eq!(payload.field("url"), "https://example.com");
        assert_eq!(payload.field("ssid"), "");
        assert_eq!(payload.fields().count(), 1);
    }

    #[test]
    fn test_absent_field_reads_empty() {
        let payload = CanonicalPayload::new(PayloadKind::Wifi);
        assert_eq!(payload.field("password"), "");
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in PayloadKind::ALL {
            assert_eq!(kind.as_str().parse::<PayloadKind>().unwrap(), kind);
            assert_eq!(kind.form_kind().payload_kind(), kind);
        }
        for kind in FormKind::ALL {
            assert_eq!(kind.as_str().parse::<FormKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_contact_is_vcard_on_the_wire() {
        assert_eq!(FormKind::Contact.payload_kind(), PayloadKind::Vcard);
        assert!("contact".parse::<PayloadKind>().is_err());
        assert!(matches!(
            "barcode".parse::<FormKind>(),
            Err(CoreError::UnknownKind(name)) if name == "barcode"
        ));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"type":"wifi","data":{"ssid":"home","password":"pw","bogus":"x"}}"#;
        let payload: CanonicalPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.kind(), PayloadKind::Wifi);
        assert_eq!(payload.field("ssid"), "home");
        assert_eq!(payload.field("bogus"), "");

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "wifi");
        assert_eq!(value["data"]["password"], "pw");
        assert!(value["data"].get("bogus").is_none());
    }
}
