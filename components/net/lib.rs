/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! URL parsing/resolution and a minimal blocking HTTP client.
//!
//! Splits the scheme, host, optional port and path out of a URL string, then
//! speaks HTTP/1.0 over a raw `TcpStream`. No TLS crate is wired in, so
//! `https://` is parsed (for origin/CSP comparisons) but `request` rejects
//! it with [`NetError::UnsupportedScheme`] rather than silently downgrading
//! to plaintext.

mod error;
mod http;
mod url;

pub use error::NetError;
pub use http::{BlockingHttpClient, HttpClient, Response};
pub use url::Url;

/// A pending outgoing request: the resource URL, the page that's requesting
/// it (unused on the wire today, kept for future `Referer`-header/CORS
/// work), and an optional POST body.
pub struct Request<'a> {
    pub url: &'a Url,
    pub referrer: Option<&'a Url>,
    pub body: Option<&'a str>,
}
