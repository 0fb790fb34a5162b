//! `mailto:` URI builder for handing a draft to the user's mail client.
//!
//! Values are percent-encoded like `encodeURIComponent`: spaces become
//! `%20`, never `+`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::database::Contact;

/// Characters `encodeURIComponent` escapes
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Address list: also keep `@` and `,` readable
const ADDRESS: &AsciiSet = &COMPONENT.remove(b'@').remove(b',');

/// Fields of a mail handoff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailtoParts<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub cc: Option<&'a str>,
    pub bcc: Option<&'a str>,
}

impl<'a> From<&'a Contact> for MailtoParts<'a> {
    fn from(contact: &'a Contact) -> Self {
        Self {
            to: &contact.email,
            subject: &contact.generated_email.subject,
            body: &contact.generated_email.body,
            cc: contact.generated_email.cc.as_deref(),
            bcc: contact.generated_email.bcc.as_deref(),
        }
    }
}

/// Build the URI; empty parts are left out
pub fn build(parts: &MailtoParts<'_>) -> String {
    let mut uri = format!("mailto:{}", utf8_percent_encode(parts.to.trim(), ADDRESS));

    let query: Vec<String> = [
        ("subject", Some(parts.subject)),
        ("body", Some(parts.body)),
        ("cc", parts.cc),
        ("bcc", parts.bcc),
    ]
    .into_iter()
    .filter_map(|(key, value)| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| format!("{}={}", key, utf8_percent_encode(v, COMPONENT)))
    })
    .collect();

    if !query.is_empty() {
        uri.push('?');
        uri.push_str(&query.join("&"));
    }
    uri
}

pub fn for_contact(contact: &Contact) -> String {
    build(&MailtoParts::from(contact))
}
