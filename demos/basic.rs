use std::sync::Arc;

use cellflow::{Cell, Geometry, Viewport, ViewportOptions};

struct Label {
    index: usize,
    text: String,
}

impl Cell<String> for Label {
    fn update_index(&mut self, index: usize) {
        self.index = index;
    }

    fn update_item(&mut self, item: &Arc<String>) {
        self.text.clone_from(item);
    }
}

fn main() {
    let items: Vec<Arc<String>> = (0..1_000).map(|i| Arc::new(format!("row {i}"))).collect();

    let opts = ViewportOptions::new(20, |item: Option<&Arc<String>>| Label {
        index: 0,
        text: item.map(|s| s.to_string()).unwrap_or_default(),
    })
    .with_initial_geometry(Geometry::new(0, 300));
    let mut vp = Viewport::new(opts).expect("factory is set");

    let r = vp.refresh(&items).expect("fixed layout");
    println!("range={:?} created={}", r.range, r.created.len());

    let r = vp.scroll_to(&items, 4_000).expect("fixed layout");
    println!(
        "range={:?} shifted={} cells_changed={}",
        r.range,
        r.shifted.len(),
        r.cells_changed()
    );

    for (index, cell) in vp.cells().take(3) {
        println!("{index}: [{}] {}", cell.index, cell.text);
    }
}
