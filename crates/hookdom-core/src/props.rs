//! Prop application shared by every [`Host`].

use crate::error::HostError;
use crate::host::{Host, HostNodeId};
use crate::vnode::{PropValue, Props, CHILDREN_PROP};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PropKind {
    Inert,
    Event(String),
    Style,
    Class,
    Boolean,
    Attribute,
}

/// Maps an `onXxx` prop name to the listener name, e.g. `onMouseDown` to `mousedown`.
pub fn event_name(prop: &str) -> Option<String> {
    let rest = prop.strip_prefix("on")?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

fn classify(name: &str, value: &PropValue) -> PropKind {
    if name == CHILDREN_PROP {
        return PropKind::Inert;
    }
    if let PropValue::Handler(_) = value {
        return event_name(name).map_or(PropKind::Inert, PropKind::Event);
    }
    match (name, value) {
        (_, PropValue::Data(_)) => PropKind::Inert,
        ("style", _) => PropKind::Style,
        ("className" | "class", _) => PropKind::Class,
        (_, PropValue::Bool(_)) => PropKind::Boolean,
        _ => PropKind::Attribute,
    }
}

pub(crate) fn apply<H: Host + ?Sized>(
    host: &mut H,
    node: HostNodeId,
    props: &Props,
) -> Result<(), HostError> {
    for (name, value) in props.iter() {
        set(host, node, name, None, value)?;
    }
    Ok(())
}

pub(crate) fn diff<H: Host + ?Sized>(
    host: &mut H,
    node: HostNodeId,
    previous: &Props,
    next: &Props,
) -> Result<(), HostError> {
    for (name, old) in previous.iter() {
        if !next.contains(name) {
            unset(host, node, name, old)?;
        }
    }
    for (name, value) in next.iter() {
        let old = previous.get(name);
        if old == Some(value) {
            continue;
        }
        set(host, node, name, old, value)?;
    }
    Ok(())
}

fn set<H: Host + ?Sized>(
    host: &mut H,
    node: HostNodeId,
    name: &str,
    old: Option<&PropValue>,
    value: &PropValue,
) -> Result<(), HostError> {
    let kind = classify(name, value);
    if let Some(old) = old {
        if classify(name, old) != kind {
            unset(host, node, name, old)?;
            return set(host, node, name, None, value);
        }
    }
    match kind {
        PropKind::Inert => Ok(()),
        PropKind::Event(event) => {
            // Old listener goes first so a host never sees both attached.
            if let Some(PropValue::Handler(previous)) = old {
                host.remove_listener(node, &event, previous)?;
            }
            match value {
                PropValue::Handler(handler) => host.add_listener(node, &event, handler.clone()),
                _ => Ok(()),
            }
        }
        PropKind::Style => set_style(host, node, old, value),
        PropKind::Class => match value.to_attr_string() {
            Some(class) => host.set_attribute(node, "class", &class),
            None => Ok(()),
        },
        PropKind::Boolean => match value {
            PropValue::Bool(true) => host.set_attribute(node, name, ""),
            _ => host.remove_attribute(node, name),
        },
        PropKind::Attribute => match value.to_attr_string() {
            Some(text) => host.set_attribute(node, name, &text),
            None => Ok(()),
        },
    }
}

fn set_style<H: Host + ?Sized>(
    host: &mut H,
    node: HostNodeId,
    old: Option<&PropValue>,
    value: &PropValue,
) -> Result<(), HostError> {
    let previous_fields = match old {
        Some(PropValue::Style(fields)) => Some(fields),
        _ => None,
    };
    match value {
        PropValue::Style(fields) => {
            match previous_fields {
                Some(previous) => {
                    for property in previous.keys() {
                        if !fields.contains_key(property) {
                            host.remove_style(node, property)?;
                        }
                    }
                }
                None if old.is_some() => host.remove_attribute(node, "style")?,
                None => {}
            }
            for (property, field) in fields.iter() {
                if previous_fields.and_then(|previous| previous.get(property)) != Some(field) {
                    host.set_style(node, property, field)?;
                }
            }
            Ok(())
        }
        other => {
            if let Some(previous) = previous_fields {
                for property in previous.keys() {
                    host.remove_style(node, property)?;
                }
            }
            match other.to_attr_string() {
                Some(text) => host.set_attribute(node, "style", &text),
                None => Ok(()),
            }
        }
    }
}

fn unset<H: Host + ?Sized>(
    host: &mut H,
    node: HostNodeId,
    name: &str,
    old: &PropValue,
) -> Result<(), HostError> {
    match classify(name, old) {
        PropKind::Inert => Ok(()),
        PropKind::Event(event) => match old {
            PropValue::Handler(handler) => host.remove_listener(node, &event, handler),
            _ => Ok(()),
        },
        PropKind::Style => match old {
            PropValue::Style(fields) => {
                for property in fields.keys() {
                    host.remove_style(node, property)?;
                }
                Ok(())
            }
            _ => host.remove_attribute(node, "style"),
        },
        PropKind::Class => host.remove_attribute(node, "class"),
        PropKind::Boolean | PropKind::Attribute => host.remove_attribute(node, name),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::host::{Event, EventHandler};
    use crate::memory::{HostOp, MemoryHost};
    use crate::vnode::VNode;

    fn props(node: VNode) -> Props {
        node.props().clone()
    }

    #[test]
    fn event_names_require_an_uppercase_letter_after_on() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onMouseDown").as_deref(), Some("mousedown"));
        assert_eq!(event_name("one"), None);
        assert_eq!(event_name("on"), None);
    }

    #[test]
    fn apply_sets_attributes_classes_booleans_and_styles() {
        let mut host = MemoryHost::new();
        let node = host.create_element("input").unwrap();
        let next = props(
            VNode::element("input")
                .with_prop("type", "checkbox")
                .with_prop("className", "toggle")
                .with_prop("checked", true)
                .with_prop("disabled", false)
                .with_prop("tabindex", 3)
                .with_prop("style", PropValue::style([("color", "red")])),
        );
        host.apply_props(node, &next).unwrap();

        assert_eq!(
            host.markup(node),
            r#"<input checked="" class="toggle" style="color: red" tabindex="3" type="checkbox"></input>"#
        );
    }

    #[test]
    fn diff_touches_only_changed_keys() {
        let mut host = MemoryHost::new();
        let node = host.create_element("div").unwrap();
        let previous = props(
            VNode::element("div")
                .with_prop("id", "a")
                .with_prop("title", "keep")
                .with_prop("hidden", true),
        );
        host.apply_props(node, &previous).unwrap();
        host.take_ops();

        let next = props(
            VNode::element("div")
                .with_prop("id", "b")
                .with_prop("title", "keep"),
        );
        host.diff_props(node, &previous, &next).unwrap();

        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::RemoveAttribute {
                    node,
                    name: "hidden".into()
                },
                HostOp::SetAttribute {
                    node,
                    name: "id".into(),
                    value: "b".into()
                },
            ]
        );
    }

    #[test]
    fn style_maps_are_patched_field_by_field() {
        let mut host = MemoryHost::new();
        let node = host.create_element("div").unwrap();
        let previous = props(
            VNode::element("div")
                .with_prop("style", PropValue::style([("color", "red"), ("width", "1px")])),
        );
        host.apply_props(node, &previous).unwrap();
        host.take_ops();

        let next = props(
            VNode::element("div")
                .with_prop("style", PropValue::style([("color", "red"), ("height", "2px")])),
        );
        host.diff_props(node, &previous, &next).unwrap();

        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::RemoveStyle {
                    node,
                    property: "width".into()
                },
                HostOp::SetStyle {
                    node,
                    property: "height".into(),
                    value: "2px".into()
                },
            ]
        );
        assert_eq!(
            host.markup(node),
            r#"<div style="color: red; height: 2px"></div>"#
        );
    }

    #[test]
    fn replacing_a_handler_detaches_the_old_one_first() {
        let mut host = MemoryHost::new();
        let node = host.create_element("button").unwrap();
        let first_calls = Rc::new(Cell::new(0));
        let second_calls = Rc::new(Cell::new(0));
        let first = {
            let calls = Rc::clone(&first_calls);
            EventHandler::new(move |_| calls.set(calls.get() + 1))
        };
        let second = {
            let calls = Rc::clone(&second_calls);
            EventHandler::new(move |_| calls.set(calls.get() + 1))
        };
        let previous = props(VNode::element("button").with_prop("onClick", first));
        let next = props(VNode::element("button").with_prop("onClick", second));
        host.apply_props(node, &previous).unwrap();
        host.take_ops();
        host.diff_props(node, &previous, &next).unwrap();

        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::RemoveListener {
                    node,
                    event: "click".into()
                },
                HostOp::AddListener {
                    node,
                    event: "click".into()
                },
            ]
        );
        assert!(host.dispatch(&Event::new("click", node)).unwrap());
        assert_eq!(first_calls.get(), 0);
        assert_eq!(second_calls.get(), 1);
    }

    #[test]
    fn children_and_data_props_never_reach_the_host() {
        let mut host = MemoryHost::new();
        let node = host.create_element("div").unwrap();
        let mut next = Props::new();
        next.insert(CHILDREN_PROP, "ignored");
        next.insert("model", PropValue::data(7u8));
        host.apply_props(node, &next).unwrap();
        assert!(host.ops().iter().all(|op| !matches!(
            op,
            HostOp::SetAttribute { .. } | HostOp::SetStyle { .. }
        )));
    }

    #[test]
    fn non_map_style_is_stringified() {
        let mut host = MemoryHost::new();
        let node = host.create_element("div").unwrap();
        let next = props(VNode::element("div").with_prop("style", "margin: 0"));
        host.apply_props(node, &next).unwrap();
        assert_eq!(host.markup(node), r#"<div style="margin: 0"></div>"#);
    }
}
