use super::{ServiceError, ServiceResult};

const MAX_LIST_ITEMS: usize = 20;
const MAX_LIST_ITEM_LEN: usize = 40;

pub fn username(raw: &str) -> ServiceResult<String> {
    let name = raw.trim().to_ascii_lowercase();
    if !(3..=32).contains(&name.len()) {
        return Err(ServiceError::invalid("username must be 3-32 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ServiceError::invalid(
            "username may only contain letters, digits and underscores",
        ));
    }
    Ok(name)
}

pub fn required_text(field: &str, raw: &str, max: usize) -> ServiceResult<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ServiceError::invalid(format!("{field} is required")));
    }
    if text.chars().count() > max {
        return Err(ServiceError::invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(text.to_string())
}

/// Empty input clears the field.
pub fn optional_text(field: &str, raw: Option<&str>, max: usize) -> ServiceResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > max => Err(ServiceError::invalid(format!(
            "{field} must be at most {max} characters"
        ))),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the
/// first spelling.
pub fn tag_list(field: &str, raw: &[String]) -> ServiceResult<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for item in raw {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if item.chars().count() > MAX_LIST_ITEM_LEN {
            return Err(ServiceError::invalid(format!(
                "{field} entries must be at most {MAX_LIST_ITEM_LEN} characters"
            )));
        }
        if out.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            continue;
        }
        out.push(item.to_string());
    }
    if out.len() > MAX_LIST_ITEMS {
        return Err(ServiceError::invalid(format!(
            "{field} may list at most {MAX_LIST_ITEMS} entries"
        )));
    }
    Ok(out)
}

pub fn year(raw: Option<u8>) -> ServiceResult<Option<u8>> {
    match raw {
        Some(y) if !(1..=6).contains(&y) => Err(ServiceError::invalid("year must be 1-6")),
        other => Ok(other),
    }
}

pub fn github_username(raw: Option<&str>) -> ServiceResult<Option<String>> {
    let Some(login) = raw.map(|s| s.trim().trim_start_matches('@')) else {
        return Ok(None);
    };
    if login.is_empty() {
        return Ok(None);
    }
    let valid = login.len() <= 39
        && !login.starts_with('-')
        && !login.ends_with('-')
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(ServiceError::invalid("invalid github username"));
    }
    Ok(Some(login.to_string()))
}

pub fn http_url(field: &str, raw: Option<&str>) -> ServiceResult<Option<String>> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let parsed = url::Url::parse(text)
        .map_err(|err| ServiceError::invalid(format!("{field} is not a valid url: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ServiceError::invalid(format!("{field} must be an http(s) url")));
    }
    Ok(Some(parsed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_normalized_and_checked() {
        assert_eq!(username("  Ada_99 ").unwrap(), "ada_99");
        assert!(username("ab").is_err());
        assert!(username("has space").is_err());
        assert!(username("émile").is_err());
    }

    #[test]
    fn tag_list_dedupes_case_insensitively() {
        let raw = vec![
            "Rust".to_string(),
            " rust ".to_string(),
            "".to_string(),
            "Go".to_string(),
        ];
        assert_eq!(tag_list("skills", &raw).unwrap(), vec!["Rust", "Go"]);
    }

    #[test]
    fn tag_list_rejects_too_many_entries() {
        let raw: Vec<String> = (0..21).map(|i| format!("skill{i}")).collect();
        assert!(tag_list("skills", &raw).is_err());
    }

    #[test]
    fn github_username_accepts_at_prefix() {
        assert_eq!(
            github_username(Some("@octo-cat")).unwrap(),
            Some("octo-cat".to_string())
        );
        assert_eq!(github_username(Some("  ")).unwrap(), None);
        assert!(github_username(Some("-bad")).is_err());
        assert!(github_username(Some("no/slash")).is_err());
    }

    #[test]
    fn http_url_requires_http_scheme() {
        assert_eq!(
            http_url("linkedinUrl", Some("https://linkedin.com/in/ada")).unwrap(),
            Some("https://linkedin.com/in/ada".to_string())
        );
        assert!(http_url("linkedinUrl", Some("ftp://example.com")).is_err());
        assert!(http_url("linkedinUrl", Some("not a url")).is_err());
        assert_eq!(http_url("linkedinUrl", None).unwrap(), None);
    }

    #[test]
    fn optional_text_clears_on_empty() {
        assert_eq!(optional_text("bio", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("bio", Some(" hi "), 10).unwrap(), Some("hi".to_string()));
        assert!(optional_text("bio", Some("0123456789x"), 10).is_err());
    }

    #[test]
    fn year_range() {
        assert_eq!(year(Some(3)).unwrap(), Some(3));
        assert!(year(Some(0)).is_err());
        assert!(year(Some(7)).is_err());
    }
}
