use url::Url;

/// Accept `example.com` as shorthand for `https://example.com`.
pub fn normalize_url(input: &str) -> anyhow::Result<String> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("URL must not be empty");
    }

    let candidate = if has_scheme(input) {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&candidate)
        .map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", input, e))?;
    Ok(url.to_string())
}

fn has_scheme(input: &str) -> bool {
    match input.split_once(':') {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && (rest.starts_with("//") || matches!(scheme, "about" | "data" | "file"))
        }
        None => false,
    }
}
