//! Username rules: `[A-Za-z0-9_]{3,32}` with an optional `#NNNN` tag

use crate::error::DomainError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;
pub const TAG_LEN: usize = 4;

/// Split `name#1234` into `("name", Some("1234"))`
pub fn split_tag(username: &str) -> (&str, Option<&str>) {
    match username.split_once('#') {
        Some((base, tag)) => (base, Some(tag)),
        None => (username, None),
    }
}

/// Exactly four ASCII digits
pub fn is_valid_tag(tag: &str) -> bool {
    tag.len() == TAG_LEN && tag.bytes().all(|b| b.is_ascii_digit())
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn validate_username(username: &str) -> Result<(), DomainError> {
    let (base, tag) = split_tag(username);

    if base.len() < MIN_USERNAME_LEN || base.len() > MAX_USERNAME_LEN {
        return Err(DomainError::InvalidUsername(format!(
            "must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !base.chars().all(is_username_char) {
        return Err(DomainError::InvalidUsername(
            "only letters, digits and underscores are allowed".to_string(),
        ));
    }
    if let Some(tag) = tag {
        if !is_valid_tag(tag) {
            return Err(DomainError::InvalidTag(tag.to_string()));
        }
    }
    Ok(())
}

/// Coerce free text into the username charset. The result may still be too
/// short to be valid.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if is_username_char(c) { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').chars().take(MAX_USERNAME_LEN).collect()
}
