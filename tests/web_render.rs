#![cfg(target_arch = "wasm32")]

use lit_dom::{web::WebDom, Config, ConfigAdapter, Output, Recognition, Renderer, Template, Value};
use std::{cell::RefCell, rc::Rc, sync::Once};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Document, Element, HtmlBodyElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
	window().unwrap().document().unwrap()
}

fn target() -> Element {
	let body = document().body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let target = document().create_element("div").unwrap();
	body.append_child(&target).unwrap();
	target
}

type ListRenderer = Renderer<WebDom, ConfigAdapter<WebDom, &'static str, String>>;

fn renderer(disposed: &Rc<RefCell<Vec<String>>>) -> ListRenderer {
	static LOG: Once = Once::new();
	LOG.call_once(tracing_wasm::set_as_global_default);

	let disposed = Rc::clone(disposed);
	Config::<WebDom, &'static str, String>::new()
		.recognize(|value| match value {
			Value::Object(name) => Recognition::View(name.to_owned()),
			value => Recognition::Pass(value),
		})
		.materialize(|name: &String, _| {
			let item = document().create_element("li").unwrap();
			item.set_text_content(Some(name.as_str()));
			Output::Node(item.into())
		})
		.dispose(move |name, _| disposed.borrow_mut().push(name))
		.build(WebDom::new(document()))
		.unwrap()
}

#[wasm_bindgen_test]
fn renders_views_into_the_document() {
	let disposed = Rc::new(RefCell::new(Vec::new()));
	let renderer = renderer(&disposed);
	let target = target();
	let node: Node = target.clone().into();

	let items = vec![Value::Object("one"), "<two>".into(), Value::Object("three")];
	renderer
		.bind(&node)
		.render(Template::tagged(["<ul>", "</ul>"], vec![items.into()]));
	assert_eq!(target.inner_html(), "<ul><li>one</li>&lt;two&gt;<li>three</li></ul>");

	renderer.bind(&node).render("cleared");
	assert_eq!(*disposed.borrow(), ["one", "three"]);
	assert_eq!(target.inner_html(), "cleared");
}

#[wasm_bindgen_test]
fn table_content_keeps_its_components() {
	let disposed = Rc::new(RefCell::new(Vec::new()));
	let renderer = renderer(&disposed);
	let target = target();
	let node: Node = target.clone().into();

	renderer.bind(&node).render(Template::tagged(
		["<table><tbody><tr><td>", "</td></tr></tbody></table>"],
		vec![Value::Object("cell")],
	));
	assert_eq!(target.query_selector("td > li").unwrap().unwrap().text_content().unwrap(), "cell");
	assert!(target.query_selector("lit-slot").unwrap().is_none());

	assert_eq!(renderer.unbind(&node), 1);
	assert_eq!(target.child_nodes().length(), 0);
}

#[wasm_bindgen_test]
fn placeholders_directly_in_tables_are_moved_out() {
	let disposed = Rc::new(RefCell::new(Vec::new()));
	let renderer = renderer(&disposed);
	let target = target();
	let node: Node = target.clone().into();

	renderer
		.bind(&node)
		.render(Template::tagged(["<table>", "</table>"], vec![Value::Object("row")]));
	assert!(target.query_selector("table li").unwrap().is_none());
	assert_eq!(target.query_selector("li").unwrap().unwrap().text_content().unwrap(), "row");

	assert_eq!(renderer.unbind(&node), 1);
}
