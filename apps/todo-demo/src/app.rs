use hookdom_core::{
    use_effect_with, use_state, EffectResult, EventHandler, PropValue, Props, RenderResult, VNode,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub done: bool,
}

fn todo_row(props: &Props) -> RenderResult {
    let id = props.int("id").unwrap_or_default();
    let done = props.bool("done").unwrap_or(false);
    let title = props.str("title").unwrap_or_default().to_owned();

    let mut row = VNode::element("li")
        .with_prop("className", if done { "todo done" } else { "todo" })
        .with_prop("style", PropValue::style([("opacity", if done { "0.5" } else { "1" })]))
        .with_child(VNode::element("span").with_child(title));
    if let Some(toggle) = props.handler("onToggle") {
        row = row.with_child(
            VNode::element("button")
                .with_prop("id", format!("toggle-{id}"))
                .with_prop("onClick", toggle.clone())
                .with_child(if done { "undo" } else { "done" }),
        );
    }
    Ok(Some(row))
}

/// Root component: a draft field, an add button and a keyed list of todos.
pub fn todo_app(_: &Props) -> RenderResult {
    let (todos, set_todos) = use_state(|| {
        vec![Todo {
            id: 1,
            title: "write the demo".to_owned(),
            done: false,
        }]
    })?;
    let (draft, set_draft) = use_state(String::new)?;
    let (next_id, set_next_id) = use_state(|| 2i64)?;

    let remaining = todos.iter().filter(|todo| !todo.done).count();
    use_effect_with(remaining, move || {
        log::info!("{remaining} todos remaining");
        EffectResult::cleanup(move || log::debug!("leaving {remaining} remaining"))
    })?;

    let on_input = {
        let set_draft = set_draft.clone();
        EventHandler::new(move |event| set_draft.set(event.value.clone().unwrap_or_default()))
    };
    let on_add = {
        let set_todos = set_todos.clone();
        let title = draft.trim().to_owned();
        EventHandler::new(move |_| {
            if title.is_empty() {
                log::warn!("ignoring empty todo");
                return;
            }
            let todo = Todo {
                id: next_id,
                title: title.clone(),
                done: false,
            };
            set_todos.update(move |todos| {
                let mut next = vec![todo];
                next.extend(todos.iter().cloned());
                next
            });
            set_next_id.set(next_id + 1);
            set_draft.set(String::new());
        })
    };

    let rows = todos.iter().map(|todo| {
        let id = todo.id;
        let set_todos = set_todos.clone();
        let toggle = EventHandler::new(move |_| {
            set_todos.update(|todos| {
                todos
                    .iter()
                    .map(|todo| Todo {
                        done: todo.done != (todo.id == id),
                        ..todo.clone()
                    })
                    .collect()
            })
        });
        VNode::component(todo_row)
            .with_key(id)
            .with_prop("id", id)
            .with_prop("title", todo.title.clone())
            .with_prop("done", todo.done)
            .with_prop("onToggle", toggle)
    });

    Ok(Some(
        VNode::element("main")
            .with_child(
                VNode::element("input")
                    .with_prop("id", "draft")
                    .with_prop("value", draft)
                    .with_prop("onInput", on_input),
            )
            .with_child(
                VNode::element("button")
                    .with_prop("id", "add")
                    .with_prop("onClick", on_add)
                    .with_child("add"),
            )
            .with_child(VNode::element("ul").with_children(rows))
            .with_child(
                VNode::element("footer").with_child(format!("{remaining} remaining")),
            ),
    ))
}
