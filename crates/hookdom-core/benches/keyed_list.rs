use hookdom_core::{use_state, HostNodeId, MemoryHost, Props, RenderResult, Renderer, VNode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ROW_COUNT: usize = 256;
const ROW_COUNT_SAMPLES: &[usize] = &[32, 128, 512, 1024];

fn row(props: &Props) -> RenderResult {
    let (selected, _) = use_state(|| false)?;
    let label = props.str("label").unwrap_or_default();
    Ok(Some(
        VNode::element("li")
            .with_prop("className", if selected { "selected" } else { "row" })
            .with_child(label.to_owned()),
    ))
}

fn list(order: &[usize]) -> VNode {
    VNode::element("ul").with_children(order.iter().map(|&id| {
        VNode::component(row)
            .with_key(id)
            .with_prop("label", format!("Row {id}"))
    }))
}

struct ListFixture {
    renderer: Renderer<MemoryHost>,
    container: HostNodeId,
    forward: Vec<usize>,
    reversed: Vec<usize>,
    flipped: bool,
}

impl ListFixture {
    fn new(rows: usize) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let forward: Vec<usize> = (0..rows).collect();
        let reversed = forward.iter().rev().copied().collect();
        Self {
            renderer: Renderer::new(host),
            container,
            forward,
            reversed,
            flipped: false,
        }
    }

    fn render(&mut self, order: &[usize]) {
        self.renderer
            .mount(list(order), self.container)
            .expect("render pass");
        // The op log grows without bound otherwise.
        self.renderer.with_host_mut(MemoryHost::take_ops);
    }

    fn flip(&mut self) {
        self.flipped = !self.flipped;
        let order = if self.flipped {
            self.reversed.clone()
        } else {
            self.forward.clone()
        };
        self.render(&order);
    }
}

fn bench_steady_state(c: &mut Criterion) {
    let mut fixture = ListFixture::new(ROW_COUNT);
    let order = fixture.forward.clone();
    fixture.render(&order);

    c.bench_function("keyed_list_steady_state", |b| {
        b.iter(|| {
            fixture.render(&order);
        });
    });
}

fn bench_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_list_reverse");
    for &rows in ROW_COUNT_SAMPLES {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            let mut fixture = ListFixture::new(rows);
            fixture.flip();
            b.iter(|| {
                fixture.flip();
                black_box(fixture.renderer.last_pass_stats());
            });
        });
    }
    group.finish();
}

fn bench_initial_mount(c: &mut Criterion) {
    c.bench_function("keyed_list_initial_mount", |b| {
        b.iter(|| {
            let mut fixture = ListFixture::new(ROW_COUNT);
            let order = fixture.forward.clone();
            fixture.render(&order);
            black_box(fixture.renderer.render_count());
        });
    });
}

criterion_group!(keyed_list, bench_steady_state, bench_reverse, bench_initial_mount);
criterion_main!(keyed_list);
