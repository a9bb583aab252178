use crate::chunk::Chunk;
use std::{
	fmt::{self, Debug, Formatter},
	rc::Rc,
};

/// A dynamic template expression.
///
/// `N` is the host's node handle type and `O` the application's object type, which the
/// [`ViewAdapter`](`crate::ViewAdapter`) may recognise as views.
pub enum Value<N, O> {
	/// Omitted without a warning.
	Empty,
	/// Escaped and inlined into the markup.
	Text(String),
	Chunk(Rc<Chunk<N>>),
	Node(N),
	/// Flattened exactly one level. Lists nested inside a list are dropped with a warning.
	List(Vec<Value<N, O>>),
	/// Called once during classification, and the result classified in its stead.
	Deferred(Box<dyn FnOnce() -> Value<N, O>>),
	Object(O),
}

impl<N, O> Value<N, O> {
	pub fn deferred(f: impl FnOnce() -> Value<N, O> + 'static) -> Self {
		Self::Deferred(Box::new(f))
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}
}

impl<N, O> Default for Value<N, O> {
	fn default() -> Self {
		Self::Empty
	}
}

impl<N: Debug, O: Debug> Debug for Value<N, O> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("Empty"),
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Chunk(chunk) => f.debug_tuple("Chunk").field(chunk).finish(),
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Self::List(values) => f.debug_tuple("List").field(values).finish(),
			Self::Deferred(_) => f.write_str("Deferred(..)"),
			Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
		}
	}
}

impl<N, O> From<&str> for Value<N, O> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl<N, O> From<String> for Value<N, O> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl<N, O> From<Rc<Chunk<N>>> for Value<N, O> {
	fn from(chunk: Rc<Chunk<N>>) -> Self {
		Self::Chunk(chunk)
	}
}

impl<N, O, T: Into<Value<N, O>>> From<Option<T>> for Value<N, O> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Empty, Into::into)
	}
}

impl<N, O, T: Into<Value<N, O>>> From<Vec<T>> for Value<N, O> {
	fn from(values: Vec<T>) -> Self {
		Self::List(values.into_iter().map(Into::into).collect())
	}
}

macro_rules! stringify_from {
	($($t:ty),*$(,)?) => {$(
		impl<N, O> From<$t> for Value<N, O> {
			fn from(value: $t) -> Self {
				Self::Text(value.to_string())
			}
		}
	)*};
}
stringify_from!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
