//! Markup conventions shared by the compiler, the flattener and the materializer.
//!
//! # Known limitation
//!
//! [`PLACEHOLDER`] is reserved syntax without an escape.
//! Escaped text can never contain it, but a *literal* template segment spelling it out verbatim
//! is indistinguishable from a real placeholder and will desynchronise that chunk's components.
//!
//! Placeholders are elements, so the host's parser treats them like any other element. Where HTML
//! doesn't allow one, like directly inside `<table>`, `<tbody>` or `<tr>`, a browser moves it out of
//! the table, and inside `<select>` it drops it. Numbered markers keep every remaining component
//! matched to its own placeholder, but a moved placeholder puts its component in the moved position.

use std::{borrow::Cow, fmt::Write};

/// Tag name of the placeholder element.
pub const SLOT_TAG: &str = "lit-slot";

/// Attribute carrying a placeholder's per-render sequence index once materialized.
pub const SLOT_ATTRIBUTE: &str = "data-slot";

/// The token a [`Chunk`](`crate::Chunk`)'s markup contains once per component.
pub const PLACEHOLDER: &str = "<lit-slot></lit-slot>";

/// Escapes the five HTML metacharacters `& < > ' "`.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
	if !text.contains(['&', '<', '>', '\'', '"']) {
		return Cow::Borrowed(text);
	}

	let mut escaped = String::with_capacity(text.len() + text.len() / 4);
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'\'' => escaped.push_str("&#39;"),
			'"' => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	Cow::Owned(escaped)
}

/// Removes leading and trailing whitespace, and whitespace *between* tags (`>   <` becomes `><`).
///
/// This is meant for a whole template. The compiler applies it piecewise, see [`collapse_between_tags`].
#[must_use]
pub fn collapse_whitespace(markup: &str) -> Cow<'_, str> {
	collapse_between_tags(markup.trim())
}

/// Removes whitespace between a `>` and the following `<` only.
///
/// Whitespace adjacent to text is kept, and so is whitespace at either end of `markup`, since a
/// template segment may end right before or start right after an interpolated value.
#[must_use]
pub fn collapse_between_tags(markup: &str) -> Cow<'_, str> {
	if !markup.contains('>') {
		return Cow::Borrowed(markup);
	}

	let mut collapsed = String::with_capacity(markup.len());
	let mut rest = markup;
	while let Some(gt) = rest.find('>') {
		collapsed.push_str(&rest[..=gt]);
		rest = &rest[gt + 1..];

		let after_whitespace = rest.trim_start();
		if after_whitespace.len() != rest.len() && after_whitespace.starts_with('<') {
			rest = after_whitespace;
		}
	}
	collapsed.push_str(rest);

	if collapsed.len() == markup.len() {
		Cow::Borrowed(markup)
	} else {
		Cow::Owned(collapsed)
	}
}

/// Rewrites each [`PLACEHOLDER`] into a marker carrying its sequence index, in document order.
///
/// Returns the rewritten markup and the number of markers written.
#[must_use]
pub fn number_placeholders(markup: &str) -> (String, usize) {
	let mut numbered = String::with_capacity(markup.len());
	let mut count = 0;
	let mut rest = markup;
	while let Some(at) = rest.find(PLACEHOLDER) {
		numbered.push_str(&rest[..at]);
		// Writing into a `String` doesn't fail.
		let _ = write!(numbered, "<{tag} {attribute}=\"{count}\"></{tag}>", tag = SLOT_TAG, attribute = SLOT_ATTRIBUTE);
		rest = &rest[at + PLACEHOLDER.len()..];
		count += 1;
	}
	numbered.push_str(rest);
	(numbered, count)
}

/// Counts the [`PLACEHOLDER`] tokens in `markup`.
#[must_use]
pub fn count_placeholders(markup: &str) -> usize {
	markup.matches(PLACEHOLDER).count()
}
