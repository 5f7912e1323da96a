//! Markdown rendering for annotation bodies.
//!
//! Bodies are CommonMark written by arbitrary users, so the generated HTML is
//! always passed through an allow-list sanitizer before it is stored.

use pulldown_cmark::{html, Options, Parser};

/// `rel` attribute forced onto every rendered link.
const LINK_REL: &str = "nofollow noopener";

/// Render `text` to sanitized HTML. `None` stays `None`.
pub fn render(text: Option<&str>) -> Option<String> {
    text.map(render_str)
}

/// Render a markdown string to sanitized HTML.
pub fn render_str(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut unsafe_html = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut unsafe_html, Parser::new_ext(text, options));

    sanitize(&unsafe_html)
}

fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .link_rel(Some(LINK_REL))
        .clean(html)
        .to_string()
}
