//! # Content Encoder
//!
//! Maps a [`CanonicalPayload`] to the exact string handed to the QR symbol
//! encoder. Every scheme here is read by third-party scanner apps, so the
//! output format is fixed down to separators and line endings:
//!
//! ```text
//! url       https://example.com
//! phone     tel:+15550100
//! sms       sms:+15550100?body=Hello%20there
//! email     mailto:a@b.c?subject=Hi&body=Hello
//! location  geo:40.7,-74.0(Office)
//! wifi      WIFI:T:WPA;S:home;P:secret;H:false;;
//! vcard     BEGIN:VCARD\r\nVERSION:3.0\r\n...\r\nEND:VCARD
//! ```
//!
//! Encoding is total: missing fields produce partial output, never an error.
//! A result that is blank after trimming means there is nothing to encode.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::payload::{CanonicalPayload, PayloadKind};

/// Characters left unescaped in URI components: `A-Za-z0-9-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Characters that must be backslash-escaped inside WIFI fields.
const WIFI_SPECIAL: [char; 4] = ['"', ';', '\\', ','];

/// Encryption value that marks an open network.
pub const WIFI_NOPASS: &str = "nopass";

/// Encryption used when none is given.
pub const WIFI_DEFAULT_ENCRYPTION: &str = "WPA";

/// vCard line separator.
const CRLF: &str = "\r\n";

/// Encode a payload into its scannable text form.
#[must_use]
pub fn encode(payload: &CanonicalPayload) -> String {
    let content = match payload.kind() {
        PayloadKind::Url => payload.field("url").to_string(),
        PayloadKind::Text => payload.field("text").to_string(),
        PayloadKind::Phone => format!("tel:{}", payload.field("phone").trim()),
        PayloadKind::Sms => encode_sms(payload),
        PayloadKind::Email => encode_email(payload),
        PayloadKind::Location => encode_location(payload),
        PayloadKind::Wifi => encode_wifi(payload),
        PayloadKind::Vcard => encode_vcard(payload),
    };

    tracing::debug!(
        kind = %payload.kind(),
        len = content.len(),
        "Encoded payload content"
    );
    content
}

/// Whether encoded content is blank, i.e. there is nothing to render.
#[must_use]
pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Percent-encode a URI component, escaping everything outside
/// `A-Za-z0-9-_.!~*'()`.
#[must_use]
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Backslash-escape `"`, `;`, `\` and `,` for a WIFI field.
#[must_use]
pub fn escape_wifi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if WIFI_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Reverse [`escape_wifi`]: drop each escaping backslash and keep the
/// character after it.
#[must_use]
pub fn unescape_wifi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a full name on single spaces into `(first, last)`.
///
/// The final token is the last name and the remaining tokens, rejoined with
/// single spaces, form the first name. A single token yields an empty last
/// name. Runs of spaces produce empty tokens, so `"Jane  Doe"` splits into
/// `("Jane ", "Doe")`.
#[must_use]
pub fn split_full_name(name: &str) -> (String, String) {
    let mut parts: Vec<&str> = name.split(' ').collect();
    let last = if parts.len() > 1 {
        parts.pop().unwrap_or_default()
    } else {
        ""
    };
    (parts.join(" "), last.to_string())
}

fn encode_sms(payload: &CanonicalPayload) -> String {
    let phone = payload.field("phone").trim();
    let message = payload.field("message");
    if message.is_empty() {
        format!("sms:{phone}")
    } else {
        format!("sms:{phone}?body={}", encode_uri_component(message))
    }
}

fn encode_email(payload: &CanonicalPayload) -> String {
    let address = payload.field("email").trim();
    let params: Vec<String> = [("subject", "subject"), ("body", "message")]
        .into_iter()
        .filter_map(|(param, key)| {
            let value = payload.field(key);
            (!value.is_empty()).then(|| format!("{param}={}", encode_uri_component(value)))
        })
        .collect();

    if params.is_empty() {
        format!("mailto:{address}")
    } else {
        format!("mailto:{address}?{}", params.join("&"))
    }
}

fn encode_location(payload: &CanonicalPayload) -> String {
    let lat = payload.field("latitude").trim();
    let lng = payload.field("longitude").trim();
    let label = payload.field("label");
    if label.is_empty() {
        format!("geo:{lat},{lng}")
    } else {
        format!("geo:{lat},{lng}({})", encode_uri_component(label))
    }
}

fn encode_wifi(payload: &CanonicalPayload) -> String {
    let encryption = match payload.field("encryption") {
        "" => WIFI_DEFAULT_ENCRYPTION,
        value => value,
    };
    let open = encryption == WIFI_NOPASS;

    let auth = if open { "" } else { encryption };
    let ssid = escape_wifi(payload.field("ssid"));
    let password = if open {
        String::new()
    } else {
        escape_wifi(payload.field("password"))
    };
    let hidden = payload.field("hidden") == "true";

    format!("WIFI:T:{auth};S:{ssid};P:{password};H:{hidden};;")
}

fn encode_vcard(payload: &CanonicalPayload) -> String {
    let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];

    let name = payload.field("name");
    if !name.is_empty() {
        let full = name.trim();
        let (first, last) = split_full_name(full);
        lines.push(format!("N:{last};{first};;;"));
        lines.push(format!("FN:{full}"));
    }

    let org = payload.field("org");
    if !org.is_empty() {
        lines.push(format!("ORG:{org}"));
    }

    let title = payload.field("title");
    if !title.is_empty() {
        lines.push(format!("TITLE:{title}"));
    }

    let phone = payload.field("phone");
    if !phone.is_empty() {
        lines.push(format!("TEL;TYPE=CELL:{}", phone.trim()));
    }

    let email = payload.field("email");
    if !email.is_empty() {
        lines.push(format!("EMAIL:{}", email.trim()));
    }

    let website = payload.field("website");
    if !website.is_empty() {
        let website = website.trim();
        if website.starts_with("http://") || website.starts_with("https://") {
            lines.push(format!("URL:{website}"));
        } else {
            lines.push(format!("URL:https://{website}"));
        }
    }

    let address = payload.field("address");
    if !address.is_empty() {
        lines.push(format!("ADR:;;{};;;;", address.trim()));
    }

    lines.push("END:VCARD".to_string());
    lines.join(CRLF)
}
