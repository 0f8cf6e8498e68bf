//! # pastedown
//!
//! Convert pasted HTML to Markdown.
//!
//! This library implements the conversion behind "paste as Markdown": a
//! clipboard payload (HTML or plain text) goes in, Markdown text ready for
//! insertion at the cursor comes out.
//!
//! ## Design
//!
//! Parsing and conversion are separate. The converter walks a [`Dom`] tree,
//! which any HTML parser can produce; the bundled `scraper`-based front-end
//! lives behind the default-on `html` feature. This keeps the core parser
//! agnostic and lets embedders that already hold a parsed tree skip the
//! parsing step entirely.
//!
//! Conversion is rule driven: each element resolves to a [`Rule`] whose
//! replacement maps the already-rendered children to a Markdown fragment.
//! Custom rules, `keep`/`remove` filters and plugins (such as [`gfm`]) hook
//! into the same registry the built-in CommonMark rules live in.
//!
//! ## Example
//!
//! ```rust
//! use pastedown::paste;
//!
//! let markdown = paste("<h1>Hello <em>World</em></h1>", true).unwrap();
//! assert_eq!(markdown, "# Hello *World*\n");
//! ```
//!
//! ## Example (custom converter)
//!
//! ```rust
//! use pastedown::{Converter, Options, Rule};
//!
//! let mut converter = Converter::with_options(Options::default());
//! converter.add_rule("mark", Rule::for_tag("mark", |content, _, _, _| {
//!     format!("=={}==", content)
//! }));
//! let markdown = converter.convert("<p><mark>note</mark></p>").unwrap();
//! assert_eq!(markdown, "==note==\n");
//! ```

mod collapse;
mod dom;
mod escape;
#[cfg(feature = "html")]
mod html;
mod options;
mod rules;
mod service;
mod utilities;

pub use collapse::collapse_whitespace;
pub use dom::{Dom, NodeId, NodeKind, NodeRef};
pub use escape::escape;
#[cfg(feature = "html")]
pub use html::parse_html;
pub use options::{
    CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, Options,
};
pub use rules::{gfm, Filter, FilterFn, References, ReplacementFn, Rule, Rules};
pub use service::Converter;
pub use utilities::*;

/// Error type for pastedown operations.
///
/// Conversion itself is total: parsing is lenient and unknown elements fall
/// back to the default rule, so no payload currently produces an error. The
/// variants and the [`Result`] alias keep the fallible signature stable for
/// front-ends (alternate parsers, payload decoders) that can fail.
#[derive(Debug, thiserror::Error)]
pub enum PastedownError {
    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PastedownError>;

/// Convert a clipboard payload with the paste defaults: ATX headings, `-`
/// bullets, `*` emphasis and fenced code blocks. When `extended` is true the
/// [`gfm`] pack (tables, strikethrough, task lists) is enabled as well.
#[cfg(feature = "html")]
pub fn paste(payload: &str, extended: bool) -> Result<String> {
    let mut converter = Converter::with_options(Options::paste_defaults());
    if extended {
        converter.use_plugin(gfm);
    }
    converter.convert(payload)
}
