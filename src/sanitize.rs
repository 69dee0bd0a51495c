/// HTML Sanitization Utility
///
/// Rich-text fields (festival/exhibition/welfare `content`) are authored in the
/// admin backoffice editor and stored as HTML. Before any of that markup is
/// served on a public endpoint it passes through `sanitize_html`, which keeps
/// only an explicit allow-list of tags and attributes and drops everything else.
///
/// Policy:
/// - Allowed tags: p, br, b, strong, i, em, u, s, h1-h4, ul, ol, li,
///   blockquote, a, img, span.
/// - Allowed attributes: `href` on `a`; `src` and `alt` on `img`. All other
///   attributes are removed, including event handlers and inline styles.
/// - URL schemes: http, https, mailto, tel for links; images additionally
///   accept `data:image/` URLs. Relative URLs pass through.
/// - Disallowed tags lose their markup; `script` and `style` lose their text
///   content as well. Plain text and allowed markup pass through verbatim.

/// Tags whose markup survives sanitization.
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "b", "strong", "i", "em", "u", "s", "h1", "h2", "h3", "h4", "ul", "ol", "li",
    "blockquote", "a", "img", "span",
];

/// Tags whose inner text must be dropped along with the markup.
const DROP_CONTENT_TAGS: &[&str] = &["script", "style"];

/// URL schemes acceptable in `href` attributes.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

// --- Parsed Tag Representation ---

struct ParsedTag<'a> {
    /// Lowercased element name.
    name: String,
    closing: bool,
    self_closing: bool,
    attrs: Vec<(String, String)>,
    /// The full `<...>` source slice, used to re-emit unmodified tags verbatim.
    raw: &'a str,
}

/// sanitize_html
///
/// Single-pass scanner over the input. Text outside of tags is copied through
/// unchanged; each tag is parsed, checked against the allow-list, and either
/// re-emitted (with filtered attributes) or dropped. Malformed markup (a `<`
/// that never closes) is neutralized as `&lt;` rather than passed through.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        rest = &rest[lt..];

        // Comments, doctype and processing instructions are dropped outright.
        if rest.starts_with("<!--") {
            rest = match rest.find("-->") {
                Some(end) => &rest[end + 3..],
                None => "",
            };
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = match rest.find('>') {
                Some(end) => &rest[end + 1..],
                None => "",
            };
            continue;
        }

        match parse_tag(rest) {
            Some(tag) => {
                let consumed = tag.raw.len();
                if ALLOWED_TAGS.contains(&tag.name.as_str()) {
                    emit_tag(&mut out, &tag);
                    rest = &rest[consumed..];
                } else if !tag.closing && DROP_CONTENT_TAGS.contains(&tag.name.as_str()) {
                    // Drop the element's text content through its close tag.
                    rest = skip_element_content(&rest[consumed..], &tag.name);
                } else {
                    rest = &rest[consumed..];
                }
            }
            None => {
                // Stray '<' with no parseable tag behind it.
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Advances past everything up to and including `</name ...>`. Case-insensitive
/// on the tag name; if the element is never closed the remainder is dropped.
fn skip_element_content<'a>(mut rest: &'a str, name: &str) -> &'a str {
    let lower_name = name.to_ascii_lowercase();
    while let Some(lt) = rest.find('<') {
        rest = &rest[lt..];
        if let Some(tag) = parse_tag(rest) {
            let consumed = tag.raw.len();
            rest = &rest[consumed..];
            if tag.closing && tag.name == lower_name {
                return rest;
            }
        } else {
            rest = &rest[1..];
        }
    }
    ""
}

/// Parses a single `<...>` run starting at `input` (which begins with '<').
/// Returns None when the run is not a syntactically plausible tag.
fn parse_tag(input: &str) -> Option<ParsedTag<'_>> {
    let end = input.find('>')?;
    let raw = &input[..=end];
    let mut body = &raw[1..raw.len() - 1];

    let closing = body.starts_with('/');
    if closing {
        body = &body[1..];
    }

    let self_closing = body.ends_with('/');
    if self_closing {
        body = &body[..body.len() - 1];
    }

    let body = body.trim();
    let name_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let name = &body[..name_end];

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let attrs = parse_attrs(&body[name_end..]);

    Some(ParsedTag {
        name: name.to_ascii_lowercase(),
        closing,
        self_closing,
        attrs,
        raw,
    })
}

/// Parses `key="value"` / `key='value'` / `key=value` / bare `key` pairs.
fn parse_attrs(mut input: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();

    loop {
        input = input.trim_start();
        if input.is_empty() {
            break;
        }

        let name_end = input
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(input.len());
        let name = input[..name_end].to_ascii_lowercase();
        input = input[name_end..].trim_start();

        if name.is_empty() {
            break;
        }

        let value = if let Some(stripped) = input.strip_prefix('=') {
            let stripped = stripped.trim_start();
            if let Some(quoted) = stripped.strip_prefix('"') {
                let close = quoted.find('"').unwrap_or(quoted.len());
                input = quoted.get(close + 1..).unwrap_or("");
                quoted[..close].to_string()
            } else if let Some(quoted) = stripped.strip_prefix('\'') {
                let close = quoted.find('\'').unwrap_or(quoted.len());
                input = quoted.get(close + 1..).unwrap_or("");
                quoted[..close].to_string()
            } else {
                let close = stripped
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(stripped.len());
                input = &stripped[close..];
                stripped[..close].to_string()
            }
        } else {
            String::new()
        };

        attrs.push((name, value));
    }

    attrs
}

/// Re-emits an allowed tag. When no attribute was filtered out the original
/// source slice is used, so clean markup round-trips byte for byte.
fn emit_tag(out: &mut String, tag: &ParsedTag<'_>) {
    if tag.closing {
        out.push_str("</");
        out.push_str(&tag.name);
        out.push('>');
        return;
    }

    let kept: Vec<&(String, String)> = tag
        .attrs
        .iter()
        .filter(|(name, value)| attr_allowed(&tag.name, name, value))
        .collect();

    if kept.len() == tag.attrs.len() {
        out.push_str(tag.raw);
        return;
    }

    out.push('<');
    out.push_str(&tag.name);
    for (name, value) in kept {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    if tag.self_closing {
        out.push_str(" /");
    }
    out.push('>');
}

/// Attribute policy: `href` on anchors, `src`/`alt` on images, nothing else.
fn attr_allowed(tag: &str, attr: &str, value: &str) -> bool {
    match (tag, attr) {
        ("a", "href") => url_allowed(value, false),
        ("img", "src") => url_allowed(value, true),
        ("img", "alt") => true,
        _ => false,
    }
}

/// Scheme allow-list. Relative URLs (no scheme) are fine; anything with an
/// explicit scheme must match the list, which rules out javascript:, vbscript:
/// and friends. `data:` is only accepted for image payloads in `src`.
fn url_allowed(value: &str, allow_data_image: bool) -> bool {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();

    // Find a scheme delimiter before any path/query character.
    let colon = match lowered.find(':') {
        Some(pos) => pos,
        None => return true,
    };
    if let Some(slash) = lowered.find(['/', '?', '#']) {
        if slash < colon {
            // The colon is inside the path; treat as relative.
            return true;
        }
    }

    let scheme = &lowered[..colon];
    if ALLOWED_SCHEMES.contains(&scheme) {
        return true;
    }
    allow_data_image && lowered.starts_with("data:image/")
}
