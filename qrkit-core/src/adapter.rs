//! # Form/Model Adapter
//!
//! Converts between the per-kind [`FormState`] the UI edits and the flat
//! [`CanonicalPayload`] the encoder consumes.
//!
//! ```text
//! FormState ──to_canonical──▶ CanonicalPayload ──to_form_state──▶ FormSelection
//! ```
//!
//! The round trip is lossless for every field except contact names: the
//! canonical model only keeps the joined full name, and splitting it back
//! puts the final space-separated token in `last_name` and everything before
//! it in `first_name`. So `("Jane Mary", "Doe")` and `("Jane", "Mary Doe")`
//! both come back as `("Jane Mary", "Doe")`, and a lone `last_name` comes
//! back as `first_name`.

use serde::{Deserialize, Serialize};

use crate::encoder::{split_full_name, WIFI_DEFAULT_ENCRYPTION};
use crate::form::{
    ContactForm, EmailForm, FormState, LocationForm, PhoneForm, SmsForm, SubRecord, TextForm,
    UrlForm, WifiForm,
};
use crate::payload::{CanonicalPayload, FormKind, PayloadKind};

/// A sub-record recovered from a canonical payload, with its form kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSelection {
    /// Form kind to select.
    pub kind: FormKind,
    /// Recovered sub-record.
    pub record: SubRecord,
}

/// Flatten the active sub-record into a fresh canonical payload.
#[must_use]
pub fn to_canonical(kind: FormKind, state: &FormState) -> CanonicalPayload {
    let payload = CanonicalPayload::new(kind.payload_kind());

    match state.sub_record(kind) {
        SubRecord::Url(f) => payload.with_field("url", f.url),
        SubRecord::Contact(f) => {
            let name = format!("{} {}", f.first_name, f.last_name);
            payload
                .with_field("name", name.trim())
                .with_field("org", f.organization)
                .with_field("title", f.title)
                .with_field("phone", f.phone)
                .with_field("email", f.email)
                .with_field("website", f.website)
                .with_field("address", f.address)
        }
        SubRecord::Text(f) => payload.with_field("text", f.text),
        SubRecord::Sms(f) => payload
            .with_field("phone", f.phone)
            .with_field("message", f.message),
        SubRecord::Email(f) => payload
            .with_field("email", f.email)
            .with_field("subject", f.subject)
            .with_field("message", f.body),
        SubRecord::Wifi(f) => {
            let encryption = if f.security.is_empty() {
                WIFI_DEFAULT_ENCRYPTION.to_string()
            } else {
                f.security
            };
            payload
                .with_field("ssid", f.ssid)
                .with_field("password", f.password)
                .with_field("encryption", encryption)
                .with_field("hidden", f.hidden.to_string())
        }
        SubRecord::Phone(f) => payload.with_field("phone", f.phone),
        SubRecord::Location(f) => payload
            .with_field("latitude", f.latitude)
            .with_field("longitude", f.longitude)
            .with_field("label", f.label),
    }
}

/// Rebuild the form selection that would produce `payload`.
#[must_use]
pub fn to_form_state(payload: &CanonicalPayload) -> FormSelection {
    let get = |key: &str| payload.field(key).to_string();

    let record = match payload.kind() {
        PayloadKind::Url => SubRecord::Url(UrlForm { url: get("url") }),
        PayloadKind::Vcard => {
            let (first_name, last_name) = split_full_name(payload.field("name"));
            SubRecord::Contact(ContactForm {
                first_name,
                last_name,
                organization: get("org"),
                title: get("title"),
                phone: get("phone"),
                email: get("email"),
                website: get("website"),
                address: get("address"),
            })
        }
        PayloadKind::Text => SubRecord::Text(TextForm { text: get("text") }),
        PayloadKind::Sms => SubRecord::Sms(SmsForm {
            phone: get("phone"),
            message: get("message"),
        }),
        PayloadKind::Email => SubRecord::Email(EmailForm {
            email: get("email"),
            subject: get("subject"),
            body: get("message"),
        }),
        PayloadKind::Wifi => SubRecord::Wifi(WifiForm {
            ssid: get("ssid"),
            password: get("password"),
            security: match payload.field("encryption") {
                "" => WIFI_DEFAULT_ENCRYPTION.to_string(),
                value => value.to_string(),
            },
            hidden: payload.field("hidden") == "true",
        }),
        PayloadKind::Phone => SubRecord::Phone(PhoneForm {
            phone: get("phone"),
        }),
        PayloadKind::Location => SubRecord::Location(LocationForm {
            latitude: get("latitude"),
            longitude: get("longitude"),
            label: get("label"),
        }),
    };

    FormSelection {
        kind: payload.kind().form_kind(),
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    fn round_trip(kind: FormKind, state: &FormState) -> FormSelection {
        to_form_state(&to_canonical(kind, state))
    }

    #[test]
    fn test_contact_becomes_vcard() {
        let mut state = FormState::new();
        state.contact.first_name = "Jane".into();
        state.contact.last_name = "Doe".into();
        state.contact.organization = "Acme".into();

        let payload = to_canonical(FormKind::Contact, &state);
        assert_eq!(payload.kind(), PayloadKind::Vcard);
        assert_eq!(payload.field("name"), "Jane Doe");
        assert_eq!(payload.field("org"), "Acme");
    }

    #[test]
    fn test_only_active_kind_is_flattened() {
        let mut state = FormState::new();
        state.url.url = "https://a.test".into();
        state.text.text = "ignored".into();

        let payload = to_canonical(FormKind::Url, &state);
        assert_eq!(payload.fields().count(), 1);
        assert_eq!(encode(&payload), "https://a.test");
    }

    #[test]
    fn test_empty_contact_name_is_not_emitted() {
        let payload = to_canonical(FormKind::Contact, &FormState::new());
        assert_eq!(payload.field("name"), "");
        assert_eq!(encode(&payload), "BEGIN:VCARD\r\nVERSION:3.0\r\nEND:VCARD");
    }

    #[test]
    fn test_two_token_name_round_trips() {
        let mut state = FormState::new();
        state.contact.first_name = "Jane".into();
        state.contact.last_name = "Doe".into();
        state.contact.website = "acme.test".into();

        let selection = round_trip(FormKind::Contact, &state);
        assert_eq!(selection.kind, FormKind::Contact);
        assert_eq!(selection.record, SubRecord::Contact(state.contact));
    }

    #[test]
    fn test_single_token_first_name_round_trips() {
        let mut state = FormState::new();
        state.contact.first_name = "Cher".into();

        let selection = round_trip(FormKind::Contact, &state);
        assert_eq!(selection.record, SubRecord::Contact(state.contact));
    }

    #[test]
    fn test_multi_token_names_redistribute() {
        let mut state = FormState::new();
        state.contact.first_name = "Jane".into();
        state.contact.last_name = "Mary Doe".into();

        let SubRecord::Contact(contact) = round_trip(FormKind::Contact, &state).record else {
            panic!("expected contact record");
        };
        assert_eq!(contact.first_name, "Jane Mary");
        assert_eq!(contact.last_name, "Doe");
    }

    #[test]
    fn test_lone_last_name_comes_back_as_first_name() {
        let mut state = FormState::new();
        state.contact.last_name = "Doe".into();

        let SubRecord::Contact(contact) = round_trip(FormKind::Contact, &state).record else {
            panic!("expected contact record");
        };
        assert_eq!(contact.first_name, "Doe");
        assert_eq!(contact.last_name, "");
    }

    #[test]
    fn test_wifi_round_trip() {
        let mut state = FormState::new();
        state.wifi = WifiForm {
            ssid: "home;net".into(),
            password: "p,w".into(),
            security: "WEP".into(),
            hidden: true,
        };

        let payload = to_canonical(FormKind::Wifi, &state);
        assert_eq!(payload.field("hidden"), "true");
        assert_eq!(
            to_form_state(&payload).record,
            SubRecord::Wifi(state.wifi.clone())
        );
    }

    #[test]
    fn test_wifi_blank_security_defaults_to_wpa() {
        let mut state = FormState::new();
        state.wifi.security = String::new();
        assert_eq!(to_canonical(FormKind::Wifi, &state).field("encryption"), "WPA");
    }

    #[test]
    fn test_every_kind_round_trips_default_state() {
        let state = FormState::new();
        for kind in FormKind::ALL {
            let selection = round_trip(kind, &state);
            assert_eq!(selection.kind, kind);
            assert_eq!(selection.record, state.sub_record(kind));
        }
    }
}
