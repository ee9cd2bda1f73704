use std::collections::BTreeMap;

use crate::config::ClientConfig;

/// `<meta name=… content=…>` entries of the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    entries: BTreeMap<String, String>,
}

impl PageMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, content)| (name.into(), content.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.entries.insert(name.into(), content.into());
    }

    /// Content of a non-blank entry.
    pub fn content(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .map(String::as_str)
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub header: String,
    pub token: String,
}

impl CsrfToken {
    /// Reads the token and header name from page metadata. Without a token
    /// there is nothing to attach; a missing header name falls back to the
    /// configured default.
    pub fn from_meta(meta: &PageMeta, config: &ClientConfig) -> Option<Self> {
        let token = meta.content(&config.csrf_token_meta)?;
        let header = meta
            .content(&config.csrf_header_meta)
            .unwrap_or(&config.default_csrf_header);
        Some(Self {
            header: header.to_string(),
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_entries() {
        let meta = PageMeta::from_pairs([("_csrf", "abc"), ("_csrf_header", "X-XSRF")]);
        let token = CsrfToken::from_meta(&meta, &ClientConfig::default()).unwrap();
        assert_eq!(token.header, "X-XSRF");
        assert_eq!(token.token, "abc");
    }

    #[test]
    fn header_name_falls_back_to_default() {
        let meta = PageMeta::from_pairs([("_csrf", "abc")]);
        let token = CsrfToken::from_meta(&meta, &ClientConfig::default()).unwrap();
        assert_eq!(token.header, "X-CSRF-TOKEN");
    }

    #[test]
    fn missing_or_blank_token_yields_none() {
        let config = ClientConfig::default();
        assert!(CsrfToken::from_meta(&PageMeta::new(), &config).is_none());
        let blank = PageMeta::from_pairs([("_csrf", " "), ("_csrf_header", "X-CSRF-TOKEN")]);
        assert!(CsrfToken::from_meta(&blank, &config).is_none());
    }
}
