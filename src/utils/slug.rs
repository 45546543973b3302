use url::Url;

/// Lowercases `text` and joins its alphanumeric runs with single hyphens.
pub fn parameterize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch == '\'' {
            // apostrophes vanish instead of splitting words
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Route parameter for an advert, `<id>-<slug>`.
pub fn advert_param(id: i64, job_title: &str) -> String {
    format!("{}-{}", id, parameterize(job_title))
}

pub fn advert_url(host: &str, id: i64, job_title: &str) -> Result<String, url::ParseError> {
    let base = if host.contains("://") {
        Url::parse(host)?
    } else {
        Url::parse(&format!("http://{}", host))?
    };
    let url = base.join(&format!("/adverts/{}", advert_param(id, job_title)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterize_collapses_punctuation() {
        assert_eq!(parameterize("Senior Rust Developer"), "senior-rust-developer");
        assert_eq!(parameterize("  C++ / Rust -- Engineer!! "), "c-rust-engineer");
        assert_eq!(parameterize("Children's Nurse"), "childrens-nurse");
        assert_eq!(parameterize("!!!"), "");
    }

    #[test]
    fn advert_url_uses_host_and_param() {
        assert_eq!(advert_param(42, "Head Chef"), "42-head-chef");
        assert_eq!(
            advert_url("jobs.example.co.uk", 42, "Head Chef").unwrap(),
            "http://jobs.example.co.uk/adverts/42-head-chef"
        );
        assert_eq!(
            advert_url("https://jobs.example.co.uk", 7, "Barista").unwrap(),
            "https://jobs.example.co.uk/adverts/7-barista"
        );
    }
}
