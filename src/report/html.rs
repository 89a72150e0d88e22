// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

/// Stylesheet embedded into the report document. The `odd`/`even` classes
/// are attached by [`band_rows`].
const STYLE: &str = "\
body { font-family: sans-serif; }\n\
table { border-collapse: collapse; }\n\
th, td { border: 1px solid #444; padding: 0.2em 0.6em; text-align: left; }\n\
tr.odd { background-color: #e8e8e8; }\n\
tr.even { background-color: #ffffff; }\n";

/// Minimal HTML escaping for attribute-free text content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Annotate every data row of a pre-rendered table fragment with an
/// alternating `odd`/`even` class, starting with `odd`.
///
/// Only rows opening directly with a data cell (`<tr><td`) are touched, so
/// header rows stay unstyled and a fragment without data rows passes
/// through unchanged. Already-banded rows no longer match the pattern,
/// which makes the transform idempotent.
pub fn band_rows(fragment: &str) -> String {
    const ROW_START: &str = "<tr><td";

    let mut out = String::with_capacity(fragment.len() + 64);
    let mut rest = fragment;
    let mut row = 0_usize;
    while let Some(pos) = rest.find(ROW_START) {
        out.push_str(&rest[..pos]);
        let class = if row % 2 == 0 { "odd" } else { "even" };
        out.push_str("<tr class=\"");
        out.push_str(class);
        out.push_str("\"><td");
        row += 1;
        rest = &rest[pos + ROW_START.len()..];
    }
    out.push_str(rest);
    out
}

/// Wrap a body fragment into a complete document with a heading.
pub fn wrap_document(title: &str, fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>\n{STYLE}</style>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         {fragment}\n\
         </body>\n\
         </html>\n",
        title = escape(title),
    )
}


// vim: ts=4 sw=4 expandtab
