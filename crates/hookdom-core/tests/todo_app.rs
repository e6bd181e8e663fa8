use std::cell::RefCell;
use std::rc::Rc;

use hookdom_core::{
    use_effect_with, use_state, EffectResult, EventHandler, PropValue, Props, RenderResult, VNode,
};
use hookdom_testing::{TestRoot, TEST_ID};

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: i64,
    title: String,
    done: bool,
}

fn todo_item(props: &Props) -> RenderResult {
    let id = props.int("id").unwrap_or_default();
    let title = props.str("title").unwrap_or_default().to_owned();
    let done = props.bool("done").unwrap_or(false);
    let (expanded, set_expanded) = use_state(|| false)?;

    let mut item = VNode::element("li")
        .with_prop("className", if done { "done" } else { "open" })
        .with_child(
            VNode::element("span")
                .with_prop(TEST_ID, format!("title-{id}"))
                .with_prop(
                    "onClick",
                    EventHandler::new(move |_| set_expanded.update(|expanded| !expanded)),
                )
                .with_child(title),
        );
    if expanded {
        item = item.with_child(VNode::element("em").with_child("details"));
    }
    for (action, prop) in [("toggle", "onToggle"), ("remove", "onRemove")] {
        if let Some(handler) = props.handler(prop) {
            item = item.with_child(
                VNode::element("button")
                    .with_prop(TEST_ID, format!("{action}-{id}"))
                    .with_prop("onClick", handler.clone())
                    .with_child(action),
            );
        }
    }
    Ok(Some(item))
}

fn todo_app(props: &Props) -> RenderResult {
    let counts = props.data::<RefCell<Vec<usize>>>("counts");
    let (todos, set_todos) = use_state(Vec::<Todo>::new)?;
    let (draft, set_draft) = use_state(String::new)?;
    let (next_id, set_next_id) = use_state(|| 1i64)?;

    let total = todos.len();
    use_effect_with(total, move || {
        if let Some(counts) = counts {
            counts.borrow_mut().push(total);
        }
        EffectResult::none()
    })?;

    let on_input = {
        let set_draft = set_draft.clone();
        EventHandler::new(move |event| set_draft.set(event.value.clone().unwrap_or_default()))
    };
    let on_add = {
        let set_todos = set_todos.clone();
        let title = draft.clone();
        EventHandler::new(move |_| {
            if title.is_empty() {
                return;
            }
            let todo = Todo {
                id: next_id,
                title: title.clone(),
                done: false,
            };
            set_todos.update(move |todos| {
                let mut next = todos.clone();
                next.push(todo);
                next
            });
            set_next_id.set(next_id + 1);
            set_draft.set(String::new());
        })
    };

    let items = todos.iter().map(|todo| {
        let id = todo.id;
        let remove = {
            let set_todos = set_todos.clone();
            EventHandler::new(move |_| {
                set_todos.update(|todos| todos.iter().filter(|t| t.id != id).cloned().collect())
            })
        };
        let toggle = {
            let set_todos = set_todos.clone();
            EventHandler::new(move |_| {
                set_todos.update(|todos| {
                    todos
                        .iter()
                        .map(|t| Todo {
                            done: if t.id == id { !t.done } else { t.done },
                            ..t.clone()
                        })
                        .collect()
                })
            })
        };
        VNode::component(todo_item)
            .with_key(id)
            .with_prop("id", id)
            .with_prop("title", todo.title.clone())
            .with_prop("done", todo.done)
            .with_prop("onToggle", toggle)
            .with_prop("onRemove", remove)
    });

    Ok(Some(
        VNode::element("section")
            .with_child(
                VNode::element("input")
                    .with_prop(TEST_ID, "draft")
                    .with_prop("value", draft.clone())
                    .with_prop("onInput", on_input),
            )
            .with_child(
                VNode::element("button")
                    .with_prop(TEST_ID, "add")
                    .with_prop("onClick", on_add)
                    .with_child("Add"),
            )
            .with_child(VNode::element("ul").with_children(items))
            .with_child(VNode::text(format!("{total} items"))),
    ))
}

fn add(root: &mut TestRoot, title: &str) {
    assert!(root.input("draft", title));
    root.pump_until_idle().unwrap();
    assert!(root.click("add"));
    root.pump_until_idle().unwrap();
}

fn position(markup: &str, needle: &str) -> usize {
    markup
        .find(needle)
        .unwrap_or_else(|| panic!("{needle} not in {markup}"))
}

#[test]
fn todo_list_keeps_item_state_through_edits() {
    let counts = Rc::new(RefCell::new(Vec::<usize>::new()));
    let mut root = TestRoot::new();
    root.set_content(
        VNode::component(todo_app).with_prop("counts", PropValue::shared(Rc::clone(&counts))),
    )
    .unwrap();
    root.pump_until_idle().unwrap();
    assert!(root.markup().ends_with("<ul></ul>0 items</section>"));

    for title in ["milk", "eggs", "bread"] {
        add(&mut root, title);
    }
    let markup = root.markup();
    assert!(markup.contains("3 items"));
    assert!(position(&markup, "milk") < position(&markup, "eggs"));
    assert!(position(&markup, "eggs") < position(&markup, "bread"));
    assert!(markup.contains("<input data-testid=\"draft\" value=\"\">"));

    assert!(root.click("title-2"));
    root.pump_until_idle().unwrap();
    assert!(root.markup().contains("eggs</span><em>details</em>"));

    assert!(root.click("remove-1"));
    root.pump_until_idle().unwrap();
    let markup = root.markup();
    assert!(!markup.contains("milk"));
    assert!(markup.contains("2 items"));
    assert!(markup.contains("eggs</span><em>details</em>"));

    assert!(root.click("toggle-3"));
    root.pump_until_idle().unwrap();
    assert!(root
        .markup()
        .contains("<li class=\"done\"><span data-testid=\"title-3\">bread</span>"));

    assert_eq!(*counts.borrow(), [0, 1, 2, 3, 2]);
}

#[test]
fn empty_drafts_are_not_added() {
    let mut root = TestRoot::new();
    root.set_content(VNode::component(todo_app)).unwrap();

    assert!(root.click("add"));
    root.pump_until_idle().unwrap();

    assert!(root.markup().contains("0 items"));
    assert_eq!(root.render_count(), 1);
}
