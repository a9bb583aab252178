use crate::{
	adapter::ViewAdapter,
	chunk::{Chunk, Component},
	compile::{Compiler, Template},
	dom::Dom,
	lifecycle::Tracker,
	materialize::{materialize, splice},
	warning::Warning,
};
use std::{
	fmt::{self, Debug, Formatter},
	rc::Rc,
};
use tracing::{instrument, trace, warn};

/// Compiles templates and renders them into targets of one [`Dom`], tracking the views involved.
///
/// Rendering is synchronous and re-entrant: views materialized during a render may render into their
/// own nodes through the [`Renderer`] reference they are given, before the outer render continues.
///
/// # Correct Use
///
/// A render target's children belong to the renderer once it rendered into that target.
/// Changing them other than through [`bind`](`Renderer::bind`) or [`unbind`](`Renderer::unbind`)
/// desynchronises the view bookkeeping from the actual tree.
pub struct Renderer<D: Dom, A: ViewAdapter<D>> {
	dom: D,
	adapter: A,
	tracker: Tracker<D, A::View>,
	collapse_whitespace: bool,
	on_warning: Option<Box<dyn Fn(Warning)>>,
}

impl<D: Dom + Debug, A: ViewAdapter<D>> Debug for Renderer<D, A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Renderer")
			.field("dom", &self.dom)
			.field("tracker", &self.tracker)
			.field("collapse_whitespace", &self.collapse_whitespace)
			.finish()
	}
}

impl<D: Dom, A: ViewAdapter<D>> Renderer<D, A> {
	#[must_use]
	pub fn new(dom: D, adapter: A) -> Self {
		Self {
			dom,
			adapter,
			tracker: Tracker::new(),
			collapse_whitespace: false,
			on_warning: None,
		}
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

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	#[must_use]
	pub fn adapter(&self) -> &A {
		&self.adapter
	}

	pub(crate) fn tracker(&self) -> &Tracker<D, A::View> {
		&self.tracker
	}

	pub(crate) fn collapses_whitespace(&self) -> bool {
		self.collapse_whitespace
	}

	pub(crate) fn warn(&self, warning: Warning) {
		warn!(code = warning.code(), "{}", warning);
		if let Some(on_warning) = &self.on_warning {
			on_warning(warning);
		}
	}

	/// Compiles `template` into a chunk, materializing any views in it right away.
	pub fn chunk(&self, template: impl Into<Template<D::Node, A::Object>>) -> Rc<Chunk<D::Node>> {
		Compiler::new(self).compile(template.into())
	}

	/// Binds `target` as render target.
	#[must_use]
	pub fn bind(&self, target: &D::Node) -> Binding<'_, D, A> {
		Binding {
			renderer: self,
			target: target.clone(),
		}
	}

	/// Disposes the views rendered into `target` and removes its content.
	///
	/// Returns the number of views disposed.
	#[instrument(skip(self))]
	pub fn unbind(&self, target: &D::Node) -> usize {
		let disposed = self.teardown(target);
		self.dom.clear_children(target);
		disposed
	}

	/// The chunk last rendered into `target`, if it is still bound.
	#[must_use]
	pub fn owned_chunk(&self, target: &D::Node) -> Option<Rc<Chunk<D::Node>>> {
		self.tracker.owned_chunk(target)
	}

	/// Whether `component` was materialized from a view that wasn't disposed yet.
	#[must_use]
	pub fn is_tracked(&self, component: &Component<D::Node>) -> bool {
		self.tracker.is_tracked(component)
	}

	fn teardown(&self, target: &D::Node) -> usize {
		self.tracker.teardown(target, |view| self.adapter.dispose(view, self))
	}
}

/// A render target bound to its [`Renderer`].
pub struct Binding<'r, D: Dom, A: ViewAdapter<D>> {
	renderer: &'r Renderer<D, A>,
	target: D::Node,
}

impl<'r, D: Dom, A: ViewAdapter<D>> Debug for Binding<'r, D, A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Binding").field("target", &self.target).finish_non_exhaustive()
	}
}

impl<'r, D: Dom, A: ViewAdapter<D>> Binding<'r, D, A> {
	#[must_use]
	pub fn target(&self) -> &D::Node {
		&self.target
	}

	/// Replaces the target's content with `template`.
	///
	/// 1. Views rendered into the target before are disposed.
	/// 2. `template` is compiled, unless it is [`Template::Built`] already.
	/// 3. The flattened chunk is materialized into a detached fragment.
	/// 4. The target's children are replaced with the fragment's in one step.
	///
	/// Returns the unflattened chunk, which can be rendered again later without recompiling.
	#[instrument(skip(self, template), fields(target = ?self.target))]
	pub fn render(&self, template: impl Into<Template<D::Node, A::Object>>) -> Rc<Chunk<D::Node>> {
		let renderer = self.renderer;
		let dom = &renderer.dom;

		let disposed = renderer.teardown(&self.target);
		trace!("Tore down {} view(s).", disposed);

		let chunk = renderer.chunk(template);
		let flat = chunk.flatten();

		let fragment = materialize(dom, flat.markup());
		let slots: Vec<&[D::Node]> = flat.components().iter().map(Component::nodes).collect();
		splice(dom, &fragment, &slots);

		dom.clear_children(&self.target);
		dom.move_children(&fragment, &self.target);

		renderer.tracker.own(self.target.clone(), Rc::clone(&chunk));
		chunk
	}
}
