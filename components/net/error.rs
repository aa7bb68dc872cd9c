/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum NetError {
    MalformedUrl(String),
    UnsupportedScheme(String),
    Io(io::Error),
    MalformedResponse(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::MalformedUrl(url) => write!(f, "malformed url: {url}"),
            NetError::UnsupportedScheme(scheme) => write!(f, "unsupported scheme: {scheme}"),
            NetError::Io(err) => write!(f, "network io error: {err}"),
            NetError::MalformedResponse(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}

impl std::error::Error for NetError {}

impl From<io::Error> for NetError {
    fn from(err: io::Error) -> Self {
        NetError::Io(err)
    }
}
