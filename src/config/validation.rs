use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, FetcherConfig, FetcherKind, PageEntry, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Largest accepted output channel capacity
const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_cache_config(&config.cache)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_pages(&config.pages)?;

    if config.fetcher.kind == FetcherKind::Http {
        validate_http_root(&config.crawler.root)?;

        let user_agent = config.user_agent.as_ref().ok_or_else(|| {
            ConfigError::Validation("[user-agent] is required when fetcher kind is 'http'".to_string())
        })?;
        validate_user_agent_config(user_agent)?;
    } else if let Some(user_agent) = &config.user_agent {
        validate_user_agent_config(user_agent)?;
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.root.trim().is_empty() {
        return Err(ConfigError::Validation("root cannot be empty".to_string()));
    }

    if config.channel_capacity < 1 || config.channel_capacity > MAX_CHANNEL_CAPACITY {
        return Err(ConfigError::Validation(format!(
            "channel_capacity must be between 1 and {}, got {}",
            MAX_CHANNEL_CAPACITY, config.channel_capacity
        )));
    }

    if config.max_concurrent_fetches == Some(0) {
        return Err(ConfigError::Validation(
            "max_concurrent_fetches must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.lock_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "lock_timeout_ms must be >= 1ms when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates the static dataset: every page needs a unique, non-empty URL
fn validate_pages(pages: &[PageEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for page in pages {
        if page.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "page url cannot be empty".to_string(),
            ));
        }

        if !seen.insert(page.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate page entry for '{}'",
                page.url
            )));
        }
    }

    Ok(())
}

/// Validates that the root can be fetched over HTTP(S)
fn validate_http_root(root: &str) -> Result<(), ConfigError> {
    let url = Url::parse(root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", root, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Root URL '{}' must use HTTP or HTTPS scheme",
            root
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageEntry {
        PageEntry {
            url: url.to_string(),
            body: String::new(),
            links: vec![],
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_validate_pages_rejects_duplicates() {
        assert!(validate_pages(&[page("a"), page("b")]).is_ok());
        assert!(validate_pages(&[page("a"), page("a")]).is_err());
        assert!(validate_pages(&[page(" ")]).is_err());
    }

    #[test]
    fn test_validate_http_root() {
        assert!(validate_http_root("https://example.com/").is_ok());
        assert!(validate_http_root("http://127.0.0.1:8080/").is_ok());

        assert!(matches!(
            validate_http_root("not a url"),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_http_root("ftp://example.com/"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_cache_config() {
        let mut cache = CacheConfig::default();
        assert!(validate_cache_config(&cache).is_ok());

        cache.lock_timeout_ms = Some(0);
        assert!(validate_cache_config(&cache).is_err());
    }
}
