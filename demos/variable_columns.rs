use std::sync::Arc;

use cellflow::{AxisLayoutCache, Cell, Geometry, LayoutMode, Viewport, ViewportOptions};

struct Column {
    index: usize,
    title: String,
}

impl Cell<String> for Column {
    fn update_index(&mut self, index: usize) {
        self.index = index;
    }

    fn update_item(&mut self, item: &Arc<String>) {
        self.title.clone_from(item);
    }
}

fn main() {
    let mut layout = AxisLayoutCache::from_widths(40, [120, 80, 200, 60, 150, 90]);
    layout.set_viewport(0, 500);
    println!("total_width={}", layout.total_width());
    layout.resize(1, 30);
    println!(
        "after resize: width(1)={:?} pos(2)={:?} last_width={:?}",
        layout.width(1),
        layout.position(2),
        layout.width(5)
    );

    let titles: Vec<Arc<String>> = (0..40).map(|i| Arc::new(format!("col {i}"))).collect();
    let opts = ViewportOptions::new(1, |item: Option<&Arc<String>>| Column {
        index: 0,
        title: item.map(|s| s.to_string()).unwrap_or_default(),
    })
    .with_layout_mode(LayoutMode::Variable)
    .with_min_element_extent(40)
    .with_initial_geometry(Geometry::new(0, 600));
    let mut vp = Viewport::new(opts).expect("factory is set");
    for i in 0..titles.len() {
        vp.layout_mut().push(60 + (i as u32 % 5) * 30);
    }

    let r = vp.refresh(&titles).expect("layout matches");
    println!("range={:?} created={}", r.range, r.created.len());

    let r = vp.scroll_to(&titles, 1_500).expect("layout matches");
    println!("range={:?} shifted={}", r.range, r.shifted.len());
    for (index, col) in vp.cells().take(2) {
        println!("{index}: [{}] {}", col.index, col.title);
    }
}
