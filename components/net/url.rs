/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::NetError;

/// A parsed URL: scheme, host, port and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    /// Parses an absolute URL of the form `scheme://host[:port][/path]`.
    pub fn parse(url: &str) -> Result<Self, NetError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| NetError::MalformedUrl(url.to_string()))?;

        match scheme {
            "http" | "https" | "file" => {}
            other => return Err(NetError::UnsupportedScheme(other.to_string())),
        }

        let rest = if rest.contains('/') {
            rest.to_string()
        } else {
            format!("{rest}/")
        };

        let (mut host, rest) = rest
            .split_once('/')
            .map(|(h, p)| (h.to_string(), format!("/{p}")))
            .unwrap_or_else(|| (rest.clone(), "/".to_string()));

        let default_port = match scheme {
            "http" => 80,
            "https" => 443,
            _ => 0,
        };
        let mut port = default_port;

        if let Some((h, p)) = host.clone().split_once(':') {
            host = h.to_string();
            port = p
                .parse()
                .map_err(|_| NetError::MalformedUrl(url.to_string()))?;
        }

        Ok(Url {
            scheme: scheme.to_string(),
            host,
            port,
            path: rest,
        })
    }

    /// Resolves a (possibly relative) URL reference against `self`, the way
    /// an `<a href>` or `<link href>` is resolved against the page's own URL.
    pub fn resolve(&self, reference: &str) -> Result<Url, NetError> {
        if reference.contains("://") {
            return Url::parse(reference);
        }

        if let Some(rest) = reference.strip_prefix("//") {
            return Url::parse(&format!("{}://{}", self.scheme, rest));
        }

        let path = if reference.starts_with('/') {
            reference.to_string()
        } else {
            let dir = match self.path.rfind('/') {
                Some(idx) => &self.path[..=idx],
                None => "/",
            };
            format!("{dir}{reference}")
        };

        let path = normalize_path(&path);

        Ok(Url {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            path,
        })
    }

    /// The `scheme://host:port` triple used for same-origin and CSP checks.
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn to_url_string(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

/// Collapses `.` and `..` path segments, matching ordinary URL path
/// normalization (`a/b/../c` -> `a/c`).
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_path() {
        let url = Url::parse("http://example.org:8080/a/b").unwrap();
        assert_eq!(url.host, "example.org");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/a/b");
    }

    #[test]
    fn defaults_path_to_slash() {
        let url = Url::parse("http://example.org").unwrap();
        assert_eq!(url.path, "/");
        assert_eq!(url.port, 80);
    }

    #[test]
    fn resolves_relative_reference_against_directory() {
        let base = Url::parse("http://example.org/a/b.html").unwrap();
        let resolved = base.resolve("c.html").unwrap();
        assert_eq!(resolved.path, "/a/c.html");
    }

    #[test]
    fn resolves_root_relative_reference() {
        let base = Url::parse("http://example.org/a/b.html").unwrap();
        let resolved = base.resolve("/c.html").unwrap();
        assert_eq!(resolved.path, "/c.html");
    }

    #[test]
    fn origin_ignores_path() {
        let a = Url::parse("http://example.org/a").unwrap();
        let b = Url::parse("http://example.org/b").unwrap();
        assert_eq!(a.origin(), b.origin());
    }

    #[test]
    fn rejects_unsupported_scheme() {
        assert!(matches!(
            Url::parse("ftp://example.org"),
            Err(NetError::UnsupportedScheme(_))
        ));
    }
}
