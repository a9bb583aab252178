//! Template compilation: classifying dynamic values and assembling [`Chunk`]s.

use crate::{
	adapter::{Output, Recognition, ViewAdapter},
	chunk::{Chunk, Component},
	dom::Dom,
	markup::{collapse_between_tags, escape, PLACEHOLDER},
	renderer::Renderer,
	value::Value,
	warning::Warning,
};
use std::{
	fmt::{self, Debug, Formatter},
	rc::Rc,
};
use tracing::{error, instrument, trace};

/// Template input in one of its calling conventions.
pub enum Template<N, O> {
	/// Literal segments interleaved with values, like a tagged template literal.
	///
	/// Segments are trusted markup and emitted verbatim. There should be exactly one more segment than values.
	Tagged { segments: Vec<String>, values: Vec<Value<N, O>> },
	/// A single value (possibly a [`Value::List`]) with all text escaped.
	Plain(Value<N, O>),
	/// A chunk compiled earlier, used as-is.
	Built(Rc<Chunk<N>>),
}

impl<N, O> Template<N, O> {
	pub fn tagged<S: Into<String>>(segments: impl IntoIterator<Item = S>, values: Vec<Value<N, O>>) -> Self {
		Self::Tagged {
			segments: segments.into_iter().map(Into::into).collect(),
			values,
		}
	}

	pub fn plain(value: impl Into<Value<N, O>>) -> Self {
		Self::Plain(value.into())
	}
}

impl<N, O> From<Value<N, O>> for Template<N, O> {
	fn from(value: Value<N, O>) -> Self {
		Self::Plain(value)
	}
}

impl<N, O> From<Rc<Chunk<N>>> for Template<N, O> {
	fn from(chunk: Rc<Chunk<N>>) -> Self {
		Self::Built(chunk)
	}
}

impl<N, O> From<&str> for Template<N, O> {
	fn from(text: &str) -> Self {
		Self::Plain(text.into())
	}
}

impl<N: Debug, O: Debug> Debug for Template<N, O> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Tagged { segments, values } => f.debug_struct("Tagged").field("segments", segments).field("values", values).finish(),
			Self::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
			Self::Built(chunk) => f.debug_tuple("Built").field(chunk).finish(),
		}
	}
}

/// Shorthand for [`Template::tagged`]: string literals are segments, everything else is a value.
///
/// Every value must be followed by a segment, so the template starts and ends with one.
///
/// ```
/// use lit_dom::{memory::Node, template, Template};
///
/// let name = "<World>";
/// let t: Template<Node, ()> = template!("<p>Hello, " (name) "!</p>");
/// assert!(matches!(t, Template::Tagged { ref segments, .. } if segments.len() == 2));
/// ```
#[macro_export]
macro_rules! template {
	($first:literal $(($value:expr) $segment:literal)*) => {
		$crate::Template::tagged(
			[$first $(, $segment)*],
			vec![$($crate::Value::from($value)),*],
		)
	};
}

enum Fragment<N> {
	Text(String),
	Component(Component<N>),
}

/// Compiles templates on behalf of one [`Renderer`].
pub(crate) struct Compiler<'r, D: Dom, A: ViewAdapter<D>> {
	renderer: &'r Renderer<D, A>,
}

impl<'r, D: Dom, A: ViewAdapter<D>> Compiler<'r, D, A> {
	pub(crate) fn new(renderer: &'r Renderer<D, A>) -> Self {
		Self { renderer }
	}

	#[instrument(skip(self, template))]
	pub(crate) fn compile(&self, template: Template<D::Node, A::Object>) -> Rc<Chunk<D::Node>> {
		let mut markup = String::new();
		let mut components = Vec::new();

		match template {
			Template::Built(chunk) => return chunk,
			Template::Plain(value) => self.emit(value, &mut markup, &mut components),
			Template::Tagged { segments, values } => {
				if values.len() + 1 != segments.len() {
					error!(
						"Tagged template has {} segment(s) but {} value(s). Missing values are empty and extra ones dropped.",
						segments.len(),
						values.len()
					);
				}

				let last = segments.len().saturating_sub(1);
				let mut values = values.into_iter();
				for (i, segment) in segments.iter().enumerate() {
					if i > 0 {
						self.emit(values.next().unwrap_or_default(), &mut markup, &mut components);
					}
					if self.renderer.collapses_whitespace() {
						// Only the template's outer ends are trimmed. Inner ends touch values.
						let mut segment = segment.as_str();
						if i == 0 {
							segment = segment.trim_start();
						}
						if i == last {
							segment = segment.trim_end();
						}
						markup.push_str(&collapse_between_tags(segment));
					} else {
						markup.push_str(segment);
					}
				}
			}
		}

		trace!("Compiled {} component(s).", components.len());
		Rc::new(Chunk::new(markup, components))
	}

	fn emit(&self, value: Value<D::Node, A::Object>, markup: &mut String, components: &mut Vec<Component<D::Node>>) {
		let mut fragments = Vec::new();
		self.parse(value, &mut fragments);
		for fragment in fragments {
			match fragment {
				Fragment::Text(text) => markup.push_str(&escape(&text)),
				Fragment::Component(component) => {
					markup.push_str(PLACEHOLDER);
					components.push(component);
				}
			}
		}
	}

	/// Classifies `value`, expanding one level of [`Value::List`].
	fn parse(&self, value: Value<D::Node, A::Object>, fragments: &mut Vec<Fragment<D::Node>>) {
		match value {
			Value::List(values) => fragments.extend(values.into_iter().filter_map(|value| self.parse_value(value))),
			value => fragments.extend(self.parse_value(value)),
		}
	}

	fn parse_value(&self, value: Value<D::Node, A::Object>) -> Option<Fragment<D::Node>> {
		let value = match value {
			Value::Empty => return None,
			Value::Text(text) => return Some(Fragment::Text(text)),
			Value::Chunk(chunk) => return Some(Fragment::Component(Component::Chunk(chunk))),
			value => self.resolve(value),
		};

		// Deferred values are called exactly once.
		let value = match value {
			Value::Deferred(f) => self.resolve(f()),
			value => value,
		};

		match value {
			Value::Empty => None,
			Value::Text(text) => Some(Fragment::Text(text)),
			Value::Chunk(chunk) => Some(Fragment::Component(Component::Chunk(chunk))),
			Value::Node(node) => Some(Fragment::Component(Component::Node(node))),
			Value::List(_) => {
				self.renderer.warn(Warning::NestedArray);
				None
			}
			Value::Object(_) | Value::Deferred(_) => {
				self.renderer.warn(Warning::UnsupportedObject);
				None
			}
		}
	}

	/// Materializes `value` if the adapter recognises it as view, and hands back anything else unchanged.
	fn resolve(&self, value: Value<D::Node, A::Object>) -> Value<D::Node, A::Object> {
		let renderer = self.renderer;
		let view = match renderer.adapter().recognize(value) {
			Recognition::Pass(value) => return value,
			Recognition::View(view) => view,
			Recognition::Scalar(view) => {
				renderer.warn(Warning::NonObjectView);
				view
			}
		};

		// May render nested content depth-first before this compilation continues.
		let component = match renderer.adapter().materialize(&view, renderer) {
			Output::Node(node) => Component::Node(node),
			Output::Nodes(nodes) => {
				trace!("Wrapping {} root(s) into a chunk.", nodes.len());
				Component::Chunk(self.compile(Template::Plain(Value::List(nodes.into_iter().map(Value::Node).collect()))))
			}
			Output::Chunk(chunk) => Component::Chunk(chunk),
		};
		renderer.tracker().track(component.clone(), view);

		match component {
			Component::Node(node) => Value::Node(node),
			Component::Chunk(chunk) => Value::Chunk(chunk),
		}
	}
}
