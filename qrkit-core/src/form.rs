//! Editable form state - one sub-record per form kind.
//!
//! The UI edits flat string maps; [`SubRecord::from_fields`] and
//! [`SubRecord::to_fields`] convert between those maps and the typed
//! sub-records held in [`FormState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoder::WIFI_DEFAULT_ENCRYPTION;
use crate::payload::FormKind;

/// Flat field map exchanged with form components.
pub type FieldMap = BTreeMap<String, String>;

/// URL form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlForm {
    /// Target URL.
    pub url: String,
}

/// Contact card form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    /// Given name(s).
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Organization.
    pub organization: String,
    /// Job title.
    pub title: String,
    /// Phone number.
    pub phone: String,
    /// Email address.
    pub email: String,
    /// Website, with or without scheme.
    pub website: String,
    /// Postal address on one line.
    pub address: String,
}

/// Plain text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextForm {
    /// Text to encode.
    pub text: String,
}

/// SMS form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsForm {
    /// Recipient number.
    pub phone: String,
    /// Message body.
    pub message: String,
}

/// Email form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailForm {
    /// Recipient address.
    pub email: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// WiFi network form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiForm {
    /// Network name.
    pub ssid: String,
    /// Network password.
    pub password: String,
    /// Authentication type (`WPA`, `WEP`, `nopass`, ...).
    pub security: String,
    /// Whether the network does not broadcast its SSID.
    pub hidden: bool,
}

impl Default for WifiForm {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            security: WIFI_DEFAULT_ENCRYPTION.to_string(),
            hidden: false,
        }
    }
}

/// Phone call form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneForm {
    /// Number to dial.
    pub phone: String,
}

/// GPS location form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationForm {
    /// Latitude in decimal degrees.
    pub latitude: String,
    /// Longitude in decimal degrees.
    pub longitude: String,
    /// Optional place label.
    pub label: String,
}

/// The sub-record of a single form kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum SubRecord {
    /// URL fields.
    Url(UrlForm),
    /// Contact fields.
    Contact(ContactForm),
    /// Text fields.
    Text(TextForm),
    /// SMS fields.
    Sms(SmsForm),
    /// Email fields.
    Email(EmailForm),
    /// WiFi fields.
    Wifi(WifiForm),
    /// Phone fields.
    Phone(PhoneForm),
    /// Location fields.
    Location(LocationForm),
}

impl SubRecord {
    /// The form kind of this sub-record.
    #[must_use]
    pub const fn kind(&self) -> FormKind {
        match self {
            Self::Url(_) => FormKind::Url,
            Self::Contact(_) => FormKind::Contact,
            Self::Text(_) => FormKind::Text,
            Self::Sms(_) => FormKind::Sms,
            Self::Email(_) => FormKind::Email,
            Self::Wifi(_) => FormKind::Wifi,
            Self::Phone(_) => FormKind::Phone,
            Self::Location(_) => FormKind::Location,
        }
    }

    /// Build a sub-record from flat form fields.
    ///
    /// Missing keys become empty strings. WiFi `hidden` is set only by the
    /// literal `"true"`, and a missing `encryption` falls back to `WPA`.
    #[must_use]
    pub fn from_fields(kind: FormKind, fields: &FieldMap) -> Self {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();

        match kind {
            FormKind::Url => Self::Url(UrlForm { url: get("url") }),
            FormKind::Contact => Self::Contact(ContactForm {
                first_name: get("firstName"),
                last_name: get("lastName"),
                organization: get("organization"),
                title: get("title"),
                phone: get("phone"),
                email: get("email"),
                website: get("website"),
                address: get("address"),
            }),
            FormKind::Text => Self::Text(TextForm { text: get("text") }),
            FormKind::Sms => Self::Sms(SmsForm {
                phone: get("phone"),
                message: get("message"),
            }),
            FormKind::Email => Self::Email(EmailForm {
                email: get("email"),
                subject: get("subject"),
                body: get("message"),
            }),
            FormKind::Wifi => {
                let security = match get("encryption") {
                    s if s.is_empty() => WIFI_DEFAULT_ENCRYPTION.to_string(),
                    s => s,
                };
                Self::Wifi(WifiForm {
                    ssid: get("ssid"),
                    password: get("password"),
                    security,
                    hidden: get("hidden") == "true",
                })
            }
            FormKind::Phone => Self::Phone(PhoneForm {
                phone: get("phone"),
            }),
            FormKind::Location => Self::Location(LocationForm {
                latitude: get("latitude"),
                longitude: get("longitude"),
                label: get("label"),
            }),
        }
    }

    /// Flatten into the field map shown by form components.
    #[must_use]
    pub fn to_fields(&self) -> FieldMap {
        let pairs: Vec<(&str, String)> = match self {
            Self::Url(f) => vec![("url", f.url.clone())],
            Self::Contact(f) => vec![
                ("firstName", f.first_name.clone()),
                ("lastName", f.last_name.clone()),
                ("organization", f.organization.clone()),
                ("title", f.title.clone()),
                ("phone", f.phone.clone()),
                ("email", f.email.clone()),
                ("website", f.website.clone()),
                ("address", f.address.clone()),
            ],
            Self::Text(f) => vec![("text", f.text.clone())],
            Self::Sms(f) => vec![("phone", f.phone.clone()), ("message", f.message.clone())],
            Self::Email(f) => vec![
                ("email", f.email.clone()),
                ("subject", f.subject.clone()),
                ("message", f.body.clone()),
            ],
            Self::Wifi(f) => vec![
                ("ssid", f.ssid.clone()),
                ("password", f.password.clone()),
                ("encryption", f.security.clone()),
                ("hidden", f.hidden.to_string()),
            ],
            Self::Phone(f) => vec![("phone", f.phone.clone())],
            Self::Location(f) => vec![
                ("latitude", f.latitude.clone()),
                ("longitude", f.longitude.clone()),
                ("label", f.label.clone()),
            ],
        };
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Editable state for every form kind at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    /// URL sub-record.
    pub url: UrlForm,
    /// Contact sub-record.
    pub contact: ContactForm,
    /// Text sub-record.
    pub text: TextForm,
    /// SMS sub-record.
    pub sms: SmsForm,
    /// Email sub-record.
    pub email: EmailForm,
    /// WiFi sub-record.
    pub wifi: WifiForm,
    /// Phone sub-record.
    pub phone: PhoneForm,
    /// Location sub-record.
    pub location: LocationForm,
}

impl FormState {
    /// Create a state with every sub-record empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the sub-record for `kind`.
    #[must_use]
    pub fn sub_record(&self, kind: FormKind) -> SubRecord {
        match kind {
            FormKind::Url => SubRecord::Url(self.url.clone()),
            FormKind::Contact => SubRecord::Contact(self.contact.clone()),
            FormKind::Text => SubRecord::Text(self.text.clone()),
            FormKind::Sms => SubRecord::Sms(self.sms.clone()),
            FormKind::Email => SubRecord::Email(self.email.clone()),
            FormKind::Wifi => SubRecord::Wifi(self.wifi.clone()),
            FormKind::Phone => SubRecord::Phone(self.phone.clone()),
            FormKind::Location => SubRecord::Location(self.location.clone()),
        }
    }

    /// Replace the sub-record of the record's own kind.
    pub fn set_sub_record(&mut self, record: SubRecord) {
        match record {
            SubRecord::Url(f) => self.url = f,
            SubRecord::Contact(f) => self.contact = f,
            SubRecord::Text(f) => self.text = f,
            SubRecord::Sms(f) => self.sms = f,
            SubRecord::Email(f) => self.email = f,
            SubRecord::Wifi(f) => self.wifi = f,
            SubRecord::Phone(f) => self.phone = f,
            SubRecord::Location(f) => self.location = f,
        }
    }

    /// Apply a raw edit from the form component of `kind`.
    ///
    /// The whole sub-record is rebuilt from `fields`; other kinds are left
    /// untouched.
    pub fn apply_edits(&mut self, kind: FormKind, fields: &FieldMap) {
        self.set_sub_record(SubRecord::from_fields(kind, fields));
    }

    /// The flat fields the form component of `kind` displays.
    #[must_use]
    pub fn component_fields(&self, kind: FormKind) -> FieldMap {
        self.sub_record(kind).to_fields()
    }
}
