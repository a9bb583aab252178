use std::fmt::{self, Display, Formatter};

/// Non-fatal render-time anomalies. The offending value is left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
	/// A list was found inside a list expression.
	NestedArray,
	/// An object that isn't a view, node or chunk was used as expression.
	UnsupportedObject,
	/// The adapter recognised a view but reported it as [`Scalar`](`crate::Recognition::Scalar`).
	NonObjectView,
}

impl Warning {
	#[must_use]
	pub fn code(self) -> &'static str {
		match self {
			Self::NestedArray => "EXP_ARRAY",
			Self::UnsupportedObject => "EXP_OBJECT",
			Self::NonObjectView => "PARSED_NON_OBJECT",
		}
	}

	#[must_use]
	pub fn message(self) -> &'static str {
		match self {
			Self::NestedArray => "A deeply nested array was used inside of a template value. Adjust your template to remove redundant nesting of arrays.",
			Self::UnsupportedObject => "An object was used inside of a template value. Objects other than views, nodes and chunks are ignored.",
			Self::NonObjectView => "A value other than an object was returned from recognize(). recognize() should return a view instance, usually an object. If you return a scalar handle instead, your views may not be disposed of correctly.",
		}
	}
}

impl Display for Warning {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "lit-dom: {}", self.message())
	}
}
