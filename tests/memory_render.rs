use lit_dom::{
	memory::{MemoryDom, Node},
	template, Config, ConfigError, Output, Recognition, Renderer, Template, Value, ViewAdapter, Warning,
};
use std::{cell::RefCell, rc::Rc};

struct Widget {
	name: &'static str,
	children: Vec<Rc<Widget>>,
}

fn widget(name: &'static str, children: Vec<Rc<Widget>>) -> Rc<Widget> {
	Rc::new(Widget { name, children })
}

/// Renders each widget as `<section>` with a heading and its children rendered into it.
struct WidgetAdapter {
	target: Node,
	log: RefCell<Vec<String>>,
}

impl ViewAdapter<MemoryDom> for WidgetAdapter {
	type Object = Rc<Widget>;
	type View = Rc<Widget>;

	fn recognize(&self, value: Value<Node, Rc<Widget>>) -> Recognition<Rc<Widget>, Node, Rc<Widget>> {
		match value {
			Value::Object(widget) => Recognition::View(widget),
			value => Recognition::Pass(value),
		}
	}

	fn materialize(&self, view: &Rc<Widget>, renderer: &Renderer<MemoryDom, Self>) -> Output<Node> {
		self.log.borrow_mut().push(format!("materialize {}", view.name));
		let section = Node::element("section");
		let children: Vec<_> = view.children.iter().cloned().map(Value::Object).collect();
		renderer
			.bind(&section)
			.render(Template::tagged(["<h1>", "</h1>", ""], vec![view.name.into(), children.into()]));
		Output::Node(section)
	}

	fn dispose(&self, view: Rc<Widget>, _: &Renderer<MemoryDom, Self>) {
		self.log
			.borrow_mut()
			.push(format!("dispose {} with {} child(ren) attached", view.name, self.target.child_count()));
	}
}

#[test]
fn widget_tree() {
	let body = Node::element("body");
	let renderer = Renderer::new(
		MemoryDom,
		WidgetAdapter {
			target: body.clone(),
			log: RefCell::default(),
		},
	);
	let tree = widget("a", vec![widget("b", vec![widget("c", vec![])]), widget("d", vec![])]);

	renderer.bind(&body).render(Value::Object(tree));
	assert_eq!(
		body.inner_html(),
		"<section><h1>a</h1><section><h1>b</h1><section><h1>c</h1></section></section><section><h1>d</h1></section></section>"
	);
	assert_eq!(
		renderer.adapter().log.take(),
		["materialize a", "materialize b", "materialize c", "materialize d"]
	);

	renderer.bind(&body).render(template!("<p>" ("replaced") "</p>"));
	assert_eq!(body.inner_html(), "<p>replaced</p>");
	assert_eq!(
		renderer.adapter().log.take(),
		[
			"dispose a with 1 child(ren) attached",
			"dispose b with 1 child(ren) attached",
			"dispose c with 1 child(ren) attached",
			"dispose d with 1 child(ren) attached",
		]
	);
}

#[test]
fn shared_widget_instances_are_disposed_once() {
	let body = Node::element("body");
	let renderer = Renderer::new(
		MemoryDom,
		WidgetAdapter {
			target: body.clone(),
			log: RefCell::default(),
		},
	);
	let shared = widget("shared", vec![]);
	let list: Value<Node, Rc<Widget>> = vec![Value::Object(Rc::clone(&shared)), Value::Object(shared)].into();

	renderer.bind(&body).render(list);
	assert_eq!(body.child_count(), 2);
	renderer.adapter().log.take();

	// Each materialization is its own component, so both are disposed.
	assert_eq!(renderer.unbind(&body), 2);
	assert_eq!(body.child_count(), 0);
}

#[test]
fn identity_defaults() {
	let renderer = Config::<MemoryDom, (), Node>::new().build(MemoryDom).unwrap();
	let body = Node::element("body");
	let node = Node::element("canvas");

	let t: Template<Node, ()> = template!("<div>" (Value::Node(node.clone())) "</div>");
	renderer.bind(&body).render(t);
	assert_eq!(body.inner_html(), "<div><canvas></canvas></div>");
	let div = body.child(0).unwrap();

	renderer.bind(&body).render("");
	assert!(node.parent().is_none());
	assert_eq!(div.child_count(), 0);
	assert_eq!(body.child_count(), 0);
}

#[test]
fn missing_options_are_reported() {
	let error = Config::<MemoryDom, (), String>::new().build(MemoryDom).unwrap_err();
	assert!(matches!(error, ConfigError::MissingOption { option: "recognize", .. }));
	assert!(error.to_string().starts_with("lit-dom: Setting \"recognize\" must be of type Fn("));

	let error = Config::<MemoryDom, (), String>::new()
		.recognize(Recognition::Pass)
		.materialize(|name, _| Output::Node(Node::element(name)))
		.build(MemoryDom)
		.unwrap_err();
	assert!(matches!(error, ConfigError::MissingOption { option: "dispose", .. }));
}

#[test]
fn warnings_reach_the_sink() {
	let warnings = Rc::new(RefCell::new(Vec::new()));
	let renderer = Config::<MemoryDom, &'static str, Node>::new()
		.on_warning({
			let warnings = Rc::clone(&warnings);
			move |warning: Warning| warnings.borrow_mut().push(warning.to_string())
		})
		.build(MemoryDom)
		.unwrap();

	let body = Node::element("body");
	let t: Template<Node, &'static str> = template!("<p>" (vec![Value::Object("object"), Value::from(vec!["nested"])]) "</p>");
	renderer.bind(&body).render(t);

	assert_eq!(body.inner_html(), "<p></p>");
	assert_eq!(
		*warnings.borrow(),
		[Warning::UnsupportedObject.to_string(), Warning::NestedArray.to_string()]
	);
	assert!(warnings.borrow()[0].starts_with("lit-dom: An object was used"));
}
