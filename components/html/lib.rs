/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A minimal tag-soup HTML parser: no standards-track tree construction
//! algorithm, no foster parenting, no encoding sniffing. Turns a response
//! body into a `wisp-dom` tree.

mod parser;

pub use parser::HtmlParser;
