//! Walkthrough of the list API with node events logged.
//!
//! Run with:
//!   RUST_LOG=nexus_unrolled=trace cargo run --example basic

use nexus_unrolled::{BoundedArena, BoundedList, UnrolledList};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut list: UnrolledList<i32, 4> = UnrolledList::new();
    list.push_back(1);
    list.push_back(2);
    list.push_back(3);
    list.push_front(0);

    // Insert after the first element
    let second = list.position_at(1).unwrap();
    list.insert(second, 10);

    // Erase the third element
    let third = list.position_at(2).unwrap();
    list.erase(third).unwrap();

    println!("list:  {list:?}");
    println!("size:  {}", list.len());
    println!("nodes: {}", list.node_count());

    // Fixed node budget: growth past it is reported, never allocated
    let mut bounded: BoundedList<i32, 4> =
        BoundedList::with_storage(BoundedArena::with_max_nodes(2));
    bounded.try_append_range(0..8).unwrap();
    match bounded.try_push_back(8) {
        Ok(_) => println!("bounded: unexpected room"),
        Err(full) => {
            println!("bounded: {full}");
            println!("bounded: got back {}", full.into_inner());
        }
    }
}
