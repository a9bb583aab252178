use crate::{chunk::Chunk, dom::Dom, renderer::Renderer, value::Value, warning::Warning};
use std::{
	any::{type_name, Any, TypeId},
	fmt::{self, Debug, Formatter},
	rc::Rc,
};
use thiserror::Error;
use tracing::error;

/// Outcome of [`ViewAdapter::recognize`].
pub enum Recognition<V, N, O> {
	/// Not a view. The value continues through classification as-is.
	Pass(Value<N, O>),
	View(V),
	/// A view given as scalar handle rather than as object.
	///
	/// It is rendered and tracked like [`View`](`Recognition::View`), but a
	/// [`Warning::NonObjectView`] is emitted since scalar handles tend to alias.
	Scalar(V),
}

/// What a view materializes into.
#[derive(Debug)]
pub enum Output<N> {
	Node(N),
	/// Multiple sibling roots, spliced in order. These are wrapped into a chunk of their own.
	Nodes(Vec<N>),
	Chunk(Rc<Chunk<N>>),
}

/// Connects the renderer to an external view model.
///
/// [`materialize`](`ViewAdapter::materialize`) and [`dispose`](`ViewAdapter::dispose`) receive the
/// calling [`Renderer`], so views can render nested content into their own nodes.
pub trait ViewAdapter<D: Dom>: Sized {
	/// Application values that may be views.
	type Object;
	type View;

	fn recognize(&self, value: Value<D::Node, Self::Object>) -> Recognition<Self::View, D::Node, Self::Object>;

	fn materialize(&self, view: &Self::View, renderer: &Renderer<D, Self>) -> Output<D::Node>;

	fn dispose(&self, view: Self::View, renderer: &Renderer<D, Self>);
}

/// Construction-time misconfiguration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
	#[error("lit-dom: Setting \"{option}\" must be of type {expected}.")]
	MissingOption { option: &'static str, expected: String },
}

type RecognizeFn<D, O, V> = dyn Fn(Value<<D as Dom>::Node, O>) -> Recognition<V, <D as Dom>::Node, O>;
type MaterializeFn<D, O, V> = dyn Fn(&V, &Renderer<D, ConfigAdapter<D, O, V>>) -> Output<<D as Dom>::Node>;
type DisposeFn<D, O, V> = dyn Fn(V, &Renderer<D, ConfigAdapter<D, O, V>>);

/// Closure-based renderer configuration.
///
/// Options that aren't set fall back to identity defaults, which only apply while views *are* nodes:
///
/// - `recognize` accepts [`Value::Node`] as view of itself,
/// - `materialize` returns the view,
/// - `dispose` removes the view from its parent.
///
/// [`build`](`Config::build`) fails if a view type other than the node type is used without
/// setting all three.
pub struct Config<D: Dom, O, V>
where
	D::Node: 'static,
	V: 'static,
{
	recognize: Option<Box<RecognizeFn<D, O, V>>>,
	materialize: Option<Box<MaterializeFn<D, O, V>>>,
	dispose: Option<Box<DisposeFn<D, O, V>>>,
	collapse_whitespace: bool,
	on_warning: Option<Box<dyn Fn(Warning)>>,
}

impl<D: Dom, O, V> Default for Config<D, O, V>
where
	D::Node: 'static,
	V: 'static,
{
	fn default() -> Self {
		Self {
			recognize: None,
			materialize: None,
			dispose: None,
			collapse_whitespace: false,
			on_warning: None,
		}
	}
}

impl<D: Dom, O, V> Debug for Config<D, O, V>
where
	D::Node: 'static,
	V: 'static,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("recognize", &self.recognize.is_some())
			.field("materialize", &self.materialize.is_some())
			.field("dispose", &self.dispose.is_some())
			.field("collapse_whitespace", &self.collapse_whitespace)
			.field("on_warning", &self.on_warning.is_some())
			.finish()
	}
}

impl<D: Dom, O, V> Config<D, O, V>
where
	D::Node: 'static,
	V: 'static,
{
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn recognize(mut self, recognize: impl Fn(Value<D::Node, O>) -> Recognition<V, D::Node, O> + 'static) -> Self {
		self.recognize = Some(Box::new(recognize));
		self
	}

	#[must_use]
	pub fn materialize(mut self, materialize: impl Fn(&V, &Renderer<D, ConfigAdapter<D, O, V>>) -> Output<D::Node> + 'static) -> Self {
		self.materialize = Some(Box::new(materialize));
		self
	}

	#[must_use]
	pub fn dispose(mut self, dispose: impl Fn(V, &Renderer<D, ConfigAdapter<D, O, V>>) + 'static) -> Self {
		self.dispose = Some(Box::new(dispose));
		self
	}

	/// Whether to [collapse whitespace](`crate::markup::collapse_whitespace`) in literal template segments.
	#[must_use]
	pub fn collapse_whitespace(mut self, collapse_whitespace: bool) -> Self {
		self.collapse_whitespace = collapse_whitespace;
		self
	}

	/// Receives each [`Warning`] in addition to it being logged.
	#[must_use]
	pub fn on_warning(mut self, on_warning: impl Fn(Warning) + 'static) -> Self {
		self.on_warning = Some(Box::new(on_warning));
		self
	}

	/// Validates the configuration and creates a renderer for `dom`.
	///
	/// # Errors
	///
	/// Iff an unset option's identity default doesn't apply to the view type.
	pub fn build(self, dom: D) -> Result<Renderer<D, ConfigAdapter<D, O, V>>, ConfigError> {
		if TypeId::of::<V>() != TypeId::of::<D::Node>() {
			let view = type_name::<V>();
			let node = type_name::<D::Node>();
			if self.recognize.is_none() {
				return Err(ConfigError::MissingOption {
					option: "recognize",
					expected: format!("Fn(Value<{}, {}>) -> Recognition<{}, ..>", node, type_name::<O>(), view),
				});
			}
			if self.materialize.is_none() {
				return Err(ConfigError::MissingOption {
					option: "materialize",
					expected: format!("Fn(&{}, &Renderer<..>) -> Output<{}>", view, node),
				});
			}
			if self.dispose.is_none() {
				return Err(ConfigError::MissingOption {
					option: "dispose",
					expected: format!("Fn({}, &Renderer<..>)", view),
				});
			}
		}

		let Self {
			recognize,
			materialize,
			dispose,
			collapse_whitespace,
			on_warning,
		} = self;
		let mut renderer = Renderer::new(dom, ConfigAdapter { recognize, materialize, dispose }).collapse_whitespace(collapse_whitespace);
		if let Some(on_warning) = on_warning {
			renderer = renderer.on_warning(on_warning);
		}
		Ok(renderer)
	}
}

/// The [`ViewAdapter`] built from a [`Config`].
pub struct ConfigAdapter<D: Dom, O, V>
where
	D::Node: 'static,
	V: 'static,
{
	recognize: Option<Box<RecognizeFn<D, O, V>>>,
	materialize: Option<Box<MaterializeFn<D, O, V>>>,
	dispose: Option<Box<DisposeFn<D, O, V>>>,
}

impl<D: Dom, O, V> ViewAdapter<D> for ConfigAdapter<D, O, V>
where
	D::Node: 'static,
	V: 'static,
{
	type Object = O;
	type View = V;

	fn recognize(&self, value: Value<D::Node, O>) -> Recognition<V, D::Node, O> {
		if let Some(recognize) = &self.recognize {
			return recognize(value);
		}
		match value {
			Value::Node(node) if TypeId::of::<D::Node>() == TypeId::of::<V>() => {
				let mut node = Some(node);
				match (&mut node as &mut dyn Any).downcast_mut::<Option<V>>().and_then(Option::take) {
					Some(view) => Recognition::View(view),
					None => {
						error!("Default `recognize` failed to take a node as view. Dropping it.");
						Recognition::Pass(Value::Empty)
					}
				}
			}
			value => Recognition::Pass(value),
		}
	}

	fn materialize(&self, view: &V, renderer: &Renderer<D, Self>) -> Output<D::Node> {
		if let Some(materialize) = &self.materialize {
			return materialize(view, renderer);
		}
		match (view as &dyn Any).downcast_ref::<D::Node>() {
			Some(node) => Output::Node(node.clone()),
			None => {
				error!("Default `materialize` applied to a view that isn't a node. Rendering nothing.");
				Output::Nodes(Vec::new())
			}
		}
	}

	fn dispose(&self, view: V, renderer: &Renderer<D, Self>) {
		if let Some(dispose) = &self.dispose {
			return dispose(view, renderer);
		}
		match (&view as &dyn Any).downcast_ref::<D::Node>() {
			Some(node) => renderer.dom().remove(node),
			None => error!("Default `dispose` applied to a view that isn't a node. Ignoring."),
		}
	}
}
