use std::sync::Arc;

use cellflow::{Cell, Geometry, ObservedList, Viewport, ViewportOptions};

#[derive(Debug)]
struct Row {
    id: u32,
}

struct RowCell {
    index: usize,
    id: Option<u32>,
}

impl Cell<Row> for RowCell {
    fn update_index(&mut self, index: usize) {
        self.index = index;
    }

    fn update_item(&mut self, item: &Arc<Row>) {
        self.id = Some(item.id);
    }
}

fn main() {
    let mut list: ObservedList<Row> = (0..100).map(|id| Row { id }).collect();

    let opts = ViewportOptions::new(10, |item: Option<&Arc<Row>>| RowCell {
        index: 0,
        id: item.map(|r| r.id),
    })
    .with_cache_capacity(8)
    .with_initial_geometry(Geometry::new(200, 100));
    let mut vp = Viewport::new(opts).expect("factory is set");
    vp.refresh(list.items()).expect("fixed layout");

    // Two inserts and a removal above the window, delivered as one batch.
    list.batch_update(|l| {
        l.insert_many(0, [Row { id: 1_000 }, Row { id: 1_001 }]);
        l.remove(50);
    });
    let batch = list.take_changes();
    let r = vp
        .on_items_changed(list.items(), &batch)
        .expect("batch matches the list");
    println!(
        "ops={} common={} shifted={} created={}",
        batch.len(),
        r.common.len(),
        r.shifted.len(),
        r.created.len()
    );

    list.sort_by(|a, b| b.id.cmp(&a.id));
    let batch = list.take_changes();
    let r = vp
        .on_items_changed(list.items(), &batch)
        .expect("batch matches the list");
    println!("after sort: range={:?} assigned={}", r.range, r.assigned());

    if let Some((index, cell)) = vp.cells().next() {
        println!("first cell: index={index} ({}) id={:?}", cell.index, cell.id);
    }
}
