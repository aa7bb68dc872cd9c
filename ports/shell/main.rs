/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The CLI entry point: one positional `url` argument, no flags, exit code
//! 0 on quit.

fn main() {
    tracing_subscriber::fmt::init();

    let url = std::env::args().nth(1).unwrap_or_else(shell::default_url);
    shell::run(url);
}
