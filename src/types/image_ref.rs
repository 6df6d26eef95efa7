// ABOUTME: Container image reference parsing and reassembly.
// ABOUTME: Handles registry/repo/image:tag, root-level names like mariadb, and tag-only overrides.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Tag used when neither the reference nor the override supplies one.
pub const DEFAULT_TAG: &str = "latest";

/// `domain[:port]/repo[/image...][:tag]`
static QUALIFIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([a-zA-Z0-9.\-]*)(?::([0-9]+))?",
        r"/([a-zA-Z0-9._\-]*)(/[/a-zA-Z0-9._\-]+)?",
        r"(?::([a-zA-Z0-9._\-]+))?$",
    ))
    .expect("qualified image pattern is valid")
});

/// Root-level images such as `mariadb` or `mariadb:10.11`.
static ROOT_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9\-]+)(?::([a-zA-Z0-9.\-]+))?$").expect("root image pattern is valid")
});

/// A bare tag, optionally prefixed with `:`.
static TAG_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:?([a-zA-Z0-9._\-]+)?$").expect("tag pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image name does not contain a domain or repo as expected")]
    MissingDomainOrRepo,

    #[error("image name is missing the actual image name")]
    MissingImageName,

    #[error("unable to parse image name: {0}")]
    Unparseable(String),
}

/// A fully qualified image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    domain: Option<String>,
    port: Option<String>,
    repository: Option<String>,
    image: String,
    tag: String,
}

impl ImageRef {
    /// Parse an image reference.
    ///
    /// `tag_fallback` is used when the reference has no tag of its own;
    /// `latest` is used when neither supplies one.
    pub fn parse(input: &str, tag_fallback: Option<&str>) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::MissingImageName);
        }

        if let Some(caps) = QUALIFIED.captures(input) {
            let domain = caps.get(1).map_or("", |m| m.as_str());
            if domain.is_empty() {
                return Err(ParseImageRefError::MissingDomainOrRepo);
            }
            let repo = caps.get(3).map_or("", |m| m.as_str());
            if repo.is_empty() {
                return Err(ParseImageRefError::MissingImageName);
            }

            // Without an image segment the repo group holds the image name.
            let (repository, image) = match caps.get(4) {
                Some(m) => (
                    Some(repo.to_string()),
                    m.as_str().trim_start_matches('/').to_string(),
                ),
                None => (None, repo.to_string()),
            };

            return Ok(Self {
                domain: Some(domain.to_string()),
                port: caps.get(2).map(|m| m.as_str().to_string()),
                repository,
                image,
                tag: resolve_tag(caps.get(5).map(|m| m.as_str()), tag_fallback),
            });
        }

        if let Some(caps) = ROOT_LEVEL.captures(input) {
            return Ok(Self {
                domain: None,
                port: None,
                repository: None,
                image: caps[1].to_string(),
                tag: resolve_tag(caps.get(2).map(|m| m.as_str()), tag_fallback),
            });
        }

        Err(ParseImageRefError::Unparseable(input.to_string()))
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The reference without its `:tag` suffix.
    pub fn image_without_tag(&self) -> String {
        let mut out = String::new();
        if let Some(ref domain) = self.domain {
            out.push_str(domain);
            if let Some(ref port) = self.port {
                out.push(':');
                out.push_str(port);
            }
            out.push('/');
        }
        if let Some(ref repository) = self.repository {
            out.push_str(repository);
            out.push('/');
        }
        out.push_str(&self.image);
        out
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.image_without_tag(), self.tag)
    }
}

/// What the new revision's images should become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTarget {
    /// Replace matching images with this reference.
    Full(ImageRef),
    /// Keep every image base and swap in this tag.
    TagOnly(String),
}

impl ImageTarget {
    /// Parse either a full reference or, with `tag_only`, a bare tag.
    pub fn parse(
        input: &str,
        tag_only: bool,
        tag_fallback: Option<&str>,
    ) -> Result<Self, ParseImageRefError> {
        if !tag_only {
            return ImageRef::parse(input, tag_fallback).map(ImageTarget::Full);
        }

        let input = input.trim();
        let caps = TAG_ONLY
            .captures(input)
            .ok_or_else(|| ParseImageRefError::Unparseable(input.to_string()))?;
        Ok(ImageTarget::TagOnly(resolve_tag(
            caps.get(1).map(|m| m.as_str()),
            tag_fallback,
        )))
    }

    pub fn tag(&self) -> &str {
        match self {
            ImageTarget::Full(image) => image.tag(),
            ImageTarget::TagOnly(tag) => tag,
        }
    }

    /// The replacement for `current`, or `None` if that image is not targeted.
    pub fn rewrite(&self, current: &str) -> Option<String> {
        match self {
            ImageTarget::Full(image) => {
                (strip_tag(current) == image.image_without_tag()).then(|| image.to_string())
            }
            ImageTarget::TagOnly(tag) => Some(format!("{}:{}", strip_tag(current), tag)),
        }
    }
}

impl fmt::Display for ImageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageTarget::Full(image) => write!(f, "{image}"),
            ImageTarget::TagOnly(tag) => write!(f, "{tag}"),
        }
    }
}

/// Remove a trailing `@digest` and `:tag` from an image string.
///
/// A colon only starts a tag when it follows the last `/`, so registry
/// ports are left alone.
pub fn strip_tag(image: &str) -> &str {
    let image = image.split_once('@').map_or(image, |(base, _)| base);
    let slash = image.rfind('/');
    match image.rfind(':') {
        Some(colon) if slash.is_none_or(|slash| colon > slash) => &image[..colon],
        _ => image,
    }
}

fn resolve_tag(explicit: Option<&str>, fallback: Option<&str>) -> String {
    explicit
        .filter(|t| !t.is_empty())
        .or(fallback.filter(|t| !t.is_empty()))
        .unwrap_or(DEFAULT_TAG)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tag_keeps_registry_port() {
        assert_eq!(strip_tag("registry:5000/app"), "registry:5000/app");
        assert_eq!(strip_tag("registry:5000/app:v1"), "registry:5000/app");
    }

    #[test]
    fn strip_tag_drops_digest() {
        assert_eq!(strip_tag("repo/app@sha256:abc"), "repo/app");
        assert_eq!(strip_tag("repo/app:v2@sha256:abc"), "repo/app");
    }

    #[test]
    fn strip_tag_root_level() {
        assert_eq!(strip_tag("mariadb:10.11"), "mariadb");
        assert_eq!(strip_tag("mariadb"), "mariadb");
    }

    #[test]
    fn explicit_tag_beats_fallback() {
        let img = ImageRef::parse("repo/app:v1", Some("v9")).unwrap();
        assert_eq!(img.tag(), "v1");
    }

    #[test]
    fn empty_fallback_means_latest() {
        let img = ImageRef::parse("repo/app", Some("")).unwrap();
        assert_eq!(img.tag(), "latest");
    }
}
