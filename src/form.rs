//! Pattern-based form extraction.
//!
//! The SAT pages are server-rendered and carry all request state in
//! hidden inputs, so the flow never needs script evaluation: it scrapes
//! the action URL and field values out of the raw HTML and replays them.
//! The flow layer treats HTML as opaque text; everything that knows about
//! markup lives here.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Identifier of the reprint/acknowledgment form on the landing page.
pub const FINAL_FORM_ID: &str = "formReimpAcuse";

/// JSF client id of the button whose partial submission triggers the
/// server-side document generation. The synthesized fields must name this
/// exact control or the server renders nothing.
pub const FINAL_FORM_BUTTON: &str = "formReimpAcuse:j_idt50";

static FORM_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<form[^>]+action="([^"]+)"[^>]*>"#).expect("static pattern")
});
static HIDDEN_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<input[^>]+type="hidden"[^>]*>"#).expect("static pattern"));
static ANY_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<input[^>]*>"#).expect("static pattern"));
static INPUT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)name="([^"]+)""#).expect("static pattern"));
static INPUT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)value="([^"]*)""#).expect("static pattern"));
static FINAL_FORM_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<form[^>]*\bid="formReimpAcuse"[^>]*>"#).expect("static pattern")
});
static FORM_TAG_ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)action="([^"]*)""#).expect("static pattern"));

/// An actionable form scraped from a page: resolved action URL plus the
/// name/value pairs to submit. Produced fresh per page, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDescriptor {
    pub action: String,
    pub fields: HashMap<String, String>,
}

/// Extract the first `<form>` with an `action` attribute, together with
/// every hidden input in the document.
///
/// The SAML relay pages expose exactly one relevant form and render all
/// handshake state as hidden inputs, sometimes outside the form tag
/// itself, so field collection is deliberately not scoped to the form.
pub fn extract_form(html: &str) -> Result<FormDescriptor> {
    let action = FORM_ACTION
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(Error::FormNotFound {
            context: "auto-submit form with action attribute",
        })?;
    let action = decode_entities(action.as_str());

    let mut fields = HashMap::new();
    for input in HIDDEN_INPUT.find_iter(html) {
        let tag = input.as_str();
        let name = INPUT_NAME.captures(tag).and_then(|c| c.get(1));
        let value = INPUT_VALUE.captures(tag).and_then(|c| c.get(1));
        if let (Some(name), Some(value)) = (name, value) {
            fields.insert(name.as_str().to_string(), decode_entities(value.as_str()));
        }
    }

    Ok(FormDescriptor { action, fields })
}

/// Extract the `formReimpAcuse` form from the landing page and synthesize
/// the four JSF partial-submission fields that emulate pressing the
/// generation button.
///
/// A plain full submit of the form does not trigger generation; the
/// server only responds to the partial-refresh protocol naming the
/// button control.
pub fn extract_final_form(html: &str, document_base: &str) -> Result<FormDescriptor> {
    let open_tag = FINAL_FORM_TAG.find(html).ok_or(Error::FormNotFound {
        context: FINAL_FORM_ID,
    })?;

    let action = FORM_TAG_ACTION
        .captures(open_tag.as_str())
        .and_then(|c| c.get(1))
        .ok_or(Error::FormNotFound {
            context: "formReimpAcuse action attribute",
        })?;
    let action = resolve_action(&decode_entities(action.as_str()), document_base);

    let body_start = open_tag.end();
    let body_end = html[body_start..]
        .to_ascii_lowercase()
        .find("</form>")
        .map(|i| body_start + i)
        .unwrap_or(html.len());
    let body = &html[body_start..body_end];

    let mut fields = HashMap::new();
    for input in ANY_INPUT.find_iter(body) {
        let tag = input.as_str();
        if let Some(name) = INPUT_NAME.captures(tag).and_then(|c| c.get(1)) {
            let value = INPUT_VALUE
                .captures(tag)
                .and_then(|c| c.get(1))
                .map(|v| decode_entities(v.as_str()))
                .unwrap_or_default();
            fields.insert(name.as_str().to_string(), value);
        }
    }

    fields.insert("javax.faces.partial.ajax".to_string(), "true".to_string());
    fields.insert("javax.faces.source".to_string(), FINAL_FORM_BUTTON.to_string());
    fields.insert("javax.faces.partial.execute".to_string(), "@all".to_string());
    fields.insert(FINAL_FORM_BUTTON.to_string(), FINAL_FORM_BUTTON.to_string());

    Ok(FormDescriptor { action, fields })
}

fn resolve_action(action: &str, base: &str) -> String {
    if action.starts_with("http://") || action.starts_with("https://") {
        action.to_string()
    } else if action.starts_with('/') {
        format!("{base}{action}")
    } else {
        format!("{base}/{action}")
    }
}

/// Decode the HTML entities the SAT pages actually emit: the five named
/// ones plus numeric references. Unknown entities pass through verbatim.
pub(crate) fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        // Entities are short; an unmatched '&' far from any ';' stays
        // literal.
        let end = rest.bytes().take(12).position(|b| b == b';');
        if let Some(end) = end {
            if let Some(decoded) = resolve_entity(&rest[1..end]) {
                out.push(decoded);
                rest = &rest[end + 1..];
                continue;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let rest = entity.strip_prefix('#')?;
            let code = if let Some(hex) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                rest.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
