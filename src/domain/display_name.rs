use unicode_segmentation::UnicodeSegmentation;

const MAX_LENGTH: usize = 256;
const FORBIDDEN_CHARACTERS: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

/// Shared rules for human-readable names: not blank, at most 256 graphemes,
/// none of the characters that commonly show up in injection attempts.
fn parse_display_name(s: String, kind: &str) -> Result<String, String> {
    let is_empty_or_whitespace = s.trim().is_empty();
    // a grapheme is a "user-perceived" character, e.g. `å` is one grapheme but two characters
    let is_too_long = s.graphemes(true).count() > MAX_LENGTH;
    let contains_forbidden_characters = s.chars().any(|g| FORBIDDEN_CHARACTERS.contains(&g));

    if is_empty_or_whitespace || is_too_long || contains_forbidden_characters {
        Err(format!("{} is not a valid {} name.", s, kind))
    } else {
        Ok(s.trim().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UserName(String);

impl UserName {
    pub fn parse(s: String) -> Result<UserName, String> {
        parse_display_name(s, "user").map(Self)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct TenantName(String);

impl TenantName {
    pub fn parse(s: String) -> Result<TenantName, String> {
        parse_display_name(s, "organization").map(Self)
    }

    /// URL-friendly identifier derived from the name,
    /// e.g. "Acme Widgets, Inc" -> "acme-widgets-inc".
    pub fn identifier(&self) -> String {
        let mut identifier = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            if c.is_alphanumeric() {
                identifier.extend(c.to_lowercase());
            } else if !identifier.is_empty() && !identifier.ends_with('-') {
                identifier.push('-');
            }
        }
        identifier.trim_end_matches('-').to_string()
    }
}

impl AsRef<str> for TenantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
