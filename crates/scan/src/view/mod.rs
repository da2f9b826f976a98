//! Zero-copy views over scanned bytes.
//!
//! A [`ByteView`] is what the scanner hands out for a recognized token. It holds the
//! token's bytes as one or more ranges of pooled buffers and never copies them; all
//! transforms (trim, dequote, percent-decode) rewrite those ranges in place. Bytes are
//! only copied when a value is materialized, e.g. by [`ByteView::to_string`].
//!
//! - [`ByteView`]: the view itself
//! - [`CharView`]: a one-char-per-byte reading of a view for literal comparisons
//! - [`Charset`]: the decoders available to [`ByteView::to_string`]

mod byte_view;
mod char_view;
mod charset;
mod uri;

pub use byte_view::ByteView;
pub use char_view::CharView;
pub use charset::Charset;
