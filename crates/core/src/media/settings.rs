use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolverSettingsError {
    #[error("invalid branding URL")]
    InvalidBrandingUrl,

    #[error("document extension cannot be empty")]
    EmptyExtension,
}

/// Configuration for `MediaResolver`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverSettings {
    branding_url: Option<Url>,
    trusted_document_hosts: Vec<String>,
    document_extensions: Vec<String>,
}

const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "epub", "odt",
];

const DEFAULT_TRUSTED_HOSTS: &[&str] = &["dropbox.com", "dl.dropboxusercontent.com", "onedrive.live.com"];

impl ResolverSettings {
    /// Link the provider-logo zone redirects to, if any.
    #[must_use]
    pub fn branding_url(&self) -> Option<&Url> {
        self.branding_url.as_ref()
    }

    #[must_use]
    pub fn trusted_document_hosts(&self) -> &[String] {
        &self.trusted_document_hosts
    }

    #[must_use]
    pub fn document_extensions(&self) -> &[String] {
        &self.document_extensions
    }

    /// True if `host` equals a trusted host or is a subdomain of one.
    #[must_use]
    pub fn is_trusted_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.trusted_document_hosts.iter().any(|trusted| {
            host == *trusted
                || host
                    .strip_suffix(trusted.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// True if `path` ends in one of the recognized document extensions.
    #[must_use]
    pub fn has_document_extension(&self, path: &str) -> bool {
        let Some((_, ext)) = path.rsplit_once('.') else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.document_extensions.iter().any(|known| *known == ext)
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            branding_url: None,
            trusted_document_hosts: DEFAULT_TRUSTED_HOSTS.iter().map(|h| (*h).to_string()).collect(),
            document_extensions: DEFAULT_DOCUMENT_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
        }
    }
}

/// Unvalidated resolver configuration. `None` fields keep their defaults.
#[derive(Clone, Debug, Default)]
pub struct ResolverSettingsDraft {
    pub branding_url: Option<String>,
    pub trusted_document_hosts: Option<Vec<String>>,
    pub document_extensions: Option<Vec<String>>,
}

impl ResolverSettingsDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ResolverSettingsError` if the branding URL does not parse or an
    /// extension is blank.
    pub fn validate(self) -> Result<ResolverSettings, ResolverSettingsError> {
        let defaults = ResolverSettings::default();

        let branding_url = match normalize_optional(self.branding_url) {
            Some(raw) => {
                Some(Url::parse(&raw).map_err(|_| ResolverSettingsError::InvalidBrandingUrl)?)
            }
            None => None,
        };

        let trusted_document_hosts = self
            .trusted_document_hosts
            .map(|hosts| {
                hosts
                    .into_iter()
                    .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.trusted_document_hosts);

        let document_extensions = match self.document_extensions {
            Some(exts) => exts
                .into_iter()
                .map(|e| {
                    let e = e.trim().trim_start_matches('.').to_ascii_lowercase();
                    if e.is_empty() {
                        Err(ResolverSettingsError::EmptyExtension)
                    } else {
                        Ok(e)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.document_extensions,
        };

        Ok(ResolverSettings {
            branding_url,
            trusted_document_hosts,
            document_extensions,
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_recognize_pdf() {
        let settings = ResolverSettings::default();
        assert!(settings.has_document_extension("/notes/week1.PDF"));
        assert!(!settings.has_document_extension("/watch"));
        assert!(settings.branding_url().is_none());
    }

    #[test]
    fn trusted_host_matches_subdomains_only_on_label_boundary() {
        let settings = ResolverSettings::default();
        assert!(settings.is_trusted_host("www.dropbox.com"));
        assert!(settings.is_trusted_host("DROPBOX.COM"));
        assert!(!settings.is_trusted_host("evildropbox.com"));
    }

    #[test]
    fn invalid_branding_url_is_rejected() {
        let err = ResolverSettingsDraft {
            branding_url: Some("not a url".into()),
            ..ResolverSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ResolverSettingsError::InvalidBrandingUrl);
    }

    #[test]
    fn draft_normalizes_extensions_and_hosts() {
        let settings = ResolverSettingsDraft {
            branding_url: Some(" https://academy.example/ ".into()),
            trusted_document_hosts: Some(vec![".Files.Example".into(), " ".into()]),
            document_extensions: Some(vec![".MD".into()]),
        }
        .validate()
        .unwrap();
        assert_eq!(settings.trusted_document_hosts(), ["files.example"]);
        assert_eq!(settings.document_extensions(), ["md"]);
        assert_eq!(
            settings.branding_url().map(Url::as_str),
            Some("https://academy.example/")
        );
    }

    #[test]
    fn blank_extension_is_rejected() {
        let err = ResolverSettingsDraft {
            document_extensions: Some(vec!["pdf".into(), ".".into()]),
            ..ResolverSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ResolverSettingsError::EmptyExtension);
    }
}
