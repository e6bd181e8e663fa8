mod app;

use anyhow::{anyhow, Context, Result};
use hookdom_core::{Event, HostNodeId, MemoryHost, Renderer, VNode};
use hookdom_runtime_std::StdRuntime;

struct Demo {
    runtime: StdRuntime,
    renderer: Renderer<MemoryHost>,
    container: HostNodeId,
}

impl Demo {
    fn new() -> Self {
        let runtime = StdRuntime::new();
        runtime.set_waker(|| log::trace!("event loop woken"));
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let renderer = Renderer::with_runtime(host, runtime.runtime());
        Self {
            runtime,
            renderer,
            container,
        }
    }

    fn fire(&self, id: &str, event: &str, value: Option<&str>) -> Result<()> {
        let target = self
            .renderer
            .with_host(|host| host.find_by_attribute(self.container, "id", id))
            .ok_or_else(|| anyhow!("no element with id {id}"))?;
        let mut event = Event::new(event, target);
        if let Some(value) = value {
            event = event.with_value(value);
        }
        let handled = self.renderer.with_host(|host| host.dispatch(&event))?;
        if !handled {
            log::warn!("{} on {id} had no listener", event.name);
        }
        self.settle()
    }

    fn settle(&self) -> Result<()> {
        let executed = self.runtime.pump();
        log::debug!("settled after {executed} tasks");
        match self.renderer.take_error() {
            Some(err) => Err(err).context("scheduled render failed"),
            None => Ok(()),
        }
    }

    fn print(&self, step: &str) {
        let markup = self.renderer.with_host(|host| host.markup(self.container));
        println!("-- {step} (pass {})", self.renderer.render_count());
        println!("{markup}");
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let demo = Demo::new();
    demo.renderer
        .mount(VNode::component(app::todo_app), demo.container)
        .context("initial mount")?;
    demo.settle()?;
    demo.print("mounted");

    demo.fire("draft", "input", Some("buy milk"))?;
    demo.fire("add", "click", None)?;
    demo.print("added a todo");

    demo.fire("toggle-1", "click", None)?;
    demo.print("completed the first todo");

    println!("-- instance tree");
    print!("{}", demo.renderer.dump_tree());

    let Demo {
        renderer,
        container,
        ..
    } = demo;
    let host = renderer.teardown().context("teardown")?;
    println!("-- after teardown: {} live host nodes", host.len());
    debug_assert!(host.children(container).is_empty());
    Ok(())
}
