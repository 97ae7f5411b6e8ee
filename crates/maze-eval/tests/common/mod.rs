//! Shared helpers for integration tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use maze_eval::{DoorLetter, Layout};

pub fn fixture(name: &str) -> Layout {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path).unwrap();
    Layout::parse(&text).unwrap()
}

pub fn letters(s: &str) -> Vec<DoorLetter> {
    s.chars().filter_map(DoorLetter::from_char).collect()
}

/// Independent shortest-path distance in edges over the doors open in
/// `open`, or `None` if `end` is unreachable.
pub fn bfs_distance(layout: &Layout, open: &[DoorLetter], start: &str, end: &str) -> Option<usize> {
    let open: HashSet<DoorLetter> = open.iter().copied().collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for door in layout.doors() {
        if open.contains(&door.letter) {
            let a = layout.cell(door.cells.0).name.as_str();
            let b = layout.cell(door.cells.1).name.as_str();
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
    }

    let mut dist = HashMap::from([(start, 0usize)]);
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        if cell == end {
            return dist.get(cell).copied();
        }
        let d = dist[cell];
        for &next in adjacency.get(cell).into_iter().flatten() {
            if !dist.contains_key(next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
    None
}
