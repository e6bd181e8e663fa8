use super::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn setup() -> (Renderer<MemoryHost>, HostNodeId) {
    let mut host = MemoryHost::new();
    let container = host.create_container();
    (Renderer::new(host), container)
}

fn markup(renderer: &Renderer<MemoryHost>, container: HostNodeId) -> String {
    renderer.with_host(|host| host.markup(container))
}

fn missing(component: &str, prop: &str) -> RenderError {
    RenderError::component(component, format!("missing prop {prop}"))
}

fn tagged_item(props: &Props) -> RenderResult {
    let serials = props
        .data::<Cell<u32>>("serials")
        .ok_or_else(|| missing("tagged_item", "serials"))?;
    let (serial, _) = use_state(|| {
        let serial = serials.get();
        serials.set(serial + 1);
        serial
    })?;
    let label = props.str("label").unwrap_or("?");
    Ok(Some(VNode::element("li").with_child(format!("{label}#{serial}"))))
}

fn tagged_list(serials: &Rc<Cell<u32>>, labels: &[&str]) -> VNode {
    VNode::element("ul").with_children(labels.iter().map(|label| {
        VNode::component(tagged_item)
            .with_key(*label)
            .with_prop("label", *label)
            .with_prop("serials", PropValue::shared(Rc::clone(serials)))
    }))
}

#[test]
fn state_follows_keys_across_reorders() {
    let (renderer, container) = setup();
    let serials = Rc::new(Cell::new(0));

    renderer
        .mount(tagged_list(&serials, &["a", "b", "c"]), container)
        .unwrap();
    assert_eq!(
        markup(&renderer, container),
        "<ul><li>a#0</li><li>b#1</li><li>c#2</li></ul>"
    );

    renderer
        .mount(tagged_list(&serials, &["c", "a", "d"]), container)
        .unwrap();
    assert_eq!(
        markup(&renderer, container),
        "<ul><li>c#2</li><li>a#0</li><li>d#3</li></ul>"
    );
    assert_eq!(renderer.hook_slot_count("root.kb"), 0);

    renderer
        .mount(tagged_list(&serials, &["b", "c", "a", "d"]), container)
        .unwrap();
    assert_eq!(
        markup(&renderer, container),
        "<ul><li>b#4</li><li>c#2</li><li>a#0</li><li>d#3</li></ul>"
    );
}

fn logging_child(props: &Props) -> RenderResult {
    let log = props
        .data::<RefCell<Vec<String>>>("log")
        .ok_or_else(|| missing("logging_child", "log"))?;
    let (mounts, _) = use_state(|| {
        log.borrow_mut().push("init".to_owned());
        1
    })?;
    let effect_log = Rc::clone(&log);
    use_effect_with((), move || {
        effect_log.borrow_mut().push("mount".to_owned());
        EffectResult::cleanup(move || effect_log.borrow_mut().push("unmount".to_owned()))
    })?;
    Ok(Some(VNode::element("b").with_child(mounts.to_string())))
}

fn toggled(log: &Log, show: bool) -> VNode {
    let mut root = VNode::element("div").with_child("head");
    if show {
        root = root.with_child(
            VNode::component(logging_child).with_prop("log", PropValue::shared(Rc::clone(log))),
        );
    }
    root
}

#[test]
fn removed_components_run_cleanups_once_and_remount_fresh() {
    let (renderer, container) = setup();
    let log: Log = Rc::default();

    renderer.mount(toggled(&log, true), container).unwrap();
    renderer.runtime().run_until_idle();
    assert_eq!(*log.borrow(), ["init", "mount"]);
    let child_path = renderer.with_root_instance(|root| {
        root.and_then(|root| root.children().get(1))
            .map(|child| child.path().to_owned())
            .unwrap_or_default()
    });
    assert!(child_path.starts_with("root.c"), "{child_path}");
    assert_eq!(renderer.hook_slot_count(&child_path), 2);

    renderer.mount(toggled(&log, false), container).unwrap();
    assert_eq!(*log.borrow(), ["init", "mount", "unmount"]);
    assert_eq!(renderer.hook_path_count(), 0);

    renderer.mount(toggled(&log, false), container).unwrap();
    renderer.runtime().run_until_idle();
    assert_eq!(log.borrow().len(), 3);

    renderer.mount(toggled(&log, true), container).unwrap();
    renderer.runtime().run_until_idle();
    assert_eq!(
        *log.borrow(),
        ["init", "mount", "unmount", "init", "mount"]
    );
    assert_eq!(markup(&renderer, container), "<div>head<b>1</b></div>");
}

fn deps_tracker(props: &Props) -> RenderResult {
    let log = props
        .data::<RefCell<Vec<String>>>("log")
        .ok_or_else(|| missing("deps_tracker", "log"))?;
    let dep = props.int("dep").unwrap_or_default();
    let effect_log = Rc::clone(&log);
    use_effect_with(dep, move || {
        effect_log.borrow_mut().push(format!("run {dep}"));
        EffectResult::cleanup(move || effect_log.borrow_mut().push(format!("clean {dep}")))
    })?;
    let every_log = Rc::clone(&log);
    use_effect(move || {
        every_log.borrow_mut().push("every".to_owned());
        EffectResult::none()
    })?;
    Ok(None)
}

#[test]
fn effects_rerun_only_when_deps_change() {
    let (renderer, container) = setup();
    let log: Log = Rc::default();
    let tracked = |dep: i64| {
        VNode::component(deps_tracker)
            .with_prop("dep", dep)
            .with_prop("log", PropValue::shared(Rc::clone(&log)))
    };

    for dep in [1, 1, 2] {
        renderer.mount(tracked(dep), container).unwrap();
        renderer.runtime().run_until_idle();
    }
    renderer.reset_root().unwrap();

    assert_eq!(
        *log.borrow(),
        ["run 1", "every", "every", "clean 1", "run 2", "every", "clean 2"]
    );
}

#[test]
fn effects_never_run_inside_the_render_pass() {
    let (renderer, container) = setup();
    let log: Log = Rc::default();
    renderer
        .mount(
            VNode::component(deps_tracker)
                .with_prop("dep", 0)
                .with_prop("log", PropValue::shared(Rc::clone(&log))),
            container,
        )
        .unwrap();

    assert!(log.borrow().is_empty());
    assert!(renderer.runtime().has_pending_tasks());
    renderer.runtime().drain_once();
    assert_eq!(*log.borrow(), ["run 0", "every"]);
}

fn conditional_hooks(props: &Props) -> RenderResult {
    if props.bool("with_state").unwrap_or(false) {
        use_state(|| 0u8)?;
    }
    use_effect(EffectResult::none)?;
    Ok(Some(VNode::text("ok")))
}

#[test]
fn changing_hook_order_aborts_the_pass_and_recovers() {
    let (renderer, container) = setup();
    let node = |with_state: bool| {
        VNode::element("main")
            .with_child(VNode::component(conditional_hooks).with_prop("with_state", with_state))
    };
    renderer.mount(node(true), container).unwrap();

    let err = renderer.mount(node(false), container).unwrap_err();
    assert!(matches!(err, RenderError::HookMismatch { cursor: 0, .. }), "{err}");
    assert_eq!(renderer.render_count(), 1);

    renderer.mount(node(true), container).unwrap();
    assert_eq!(markup(&renderer, container), "<main>ok</main>");
    assert_eq!(renderer.with_host(|host| host.children(container).len()), 1);
}

#[test]
fn hooks_outside_a_render_fail() {
    assert_eq!(
        use_state(|| 1).map(|(value, _)| value),
        Err(RenderError::HookOutsideComponent)
    );
    assert_eq!(
        use_effect_with(1, EffectResult::none),
        Err(RenderError::HookOutsideComponent)
    );
}

#[test]
fn hooks_in_plain_host_trees_are_not_components() {
    let (renderer, container) = setup();
    renderer.mount(VNode::element("div"), container).unwrap();
    assert_eq!(renderer.hook_path_count(), 0);
}

#[test]
fn setter_after_unmount_is_ignored() {
    let (renderer, container) = setup();
    let slot: Rc<RefCell<Option<StateSetter<i32>>>> = Rc::default();
    let captured = Rc::clone(&slot);
    renderer
        .mount(
            VNode::component(move |_: &Props| {
                let (value, set_value) = use_state(|| 7)?;
                *captured.borrow_mut() = Some(set_value);
                Ok(Some(VNode::text(value.to_string())))
            }),
            container,
        )
        .unwrap();
    let setter = slot.borrow_mut().take().unwrap();

    renderer.reset_root().unwrap();
    setter.set(8);

    assert!(!renderer.is_render_scheduled());
    assert!(!renderer.runtime().has_pending_tasks());
    assert_eq!(markup(&renderer, container), "");
}
