/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Provides a default file URL when no `url` argument is given on launch.

use std::fs;
use std::path::PathBuf;

const DEFAULT_DOCUMENT: &str = r#"<!doctype html>
<html>
<body>
<h1 style="background-color:lightblue">wisp</h1>
<p>This is the default page, shown when no <code>url</code> argument is
given on the command line.</p>
</body>
</html>
"#;

/// Writes [`DEFAULT_DOCUMENT`] to a fixed path under the OS temp directory
/// (once; subsequent calls reuse the existing file) and returns a `file://`
/// URL pointing at it. `wisp-net`'s `file://` loader reads a plain
/// filesystem path, so this is the simplest way to hand the default page
/// through the same `HttpClient` trait every other load goes through.
pub fn default_url() -> String {
    let path: PathBuf = std::env::temp_dir().join("wisp-default.html");
    if !path.exists() {
        if let Err(err) = fs::write(&path, DEFAULT_DOCUMENT) {
            log::warn!("failed to write default document to {}: {err}", path.display());
        }
    }
    format!("file://{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_points_at_an_existing_file() {
        let url = default_url();
        let path = url.strip_prefix("file://").unwrap();
        assert!(std::path::Path::new(path).exists());
    }
}
