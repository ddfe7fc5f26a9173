use crate::object::{Arena, CopyMap, Handle, ObjectError, Relink};

/// 带若干出边的测试节点
#[derive(Debug, Clone, PartialEq)]
struct Cell {
    label: &'static str,
    next: Vec<Handle>,
}

impl Relink for Cell {
    fn links(&self) -> Vec<Handle> {
        self.next.clone()
    }

    fn relink<F>(&mut self, map: F) -> Result<(), ObjectError>
    where
        F: Fn(Handle) -> Result<Handle, ObjectError>,
    {
        for h in &mut self.next {
            *h = map(*h)?;
        }
        Ok(())
    }
}

fn cell(label: &'static str) -> Cell {
    Cell { label, next: vec![] }
}

#[test]
fn test_deep_copy_preserves_sharing() {
    // root -> a, root -> b, a -> shared, b -> shared
    let mut src = Arena::new();
    let shared = src.insert(cell("shared"));
    let a = src.insert(Cell { label: "a", next: vec![shared] });
    let b = src.insert(Cell { label: "b", next: vec![shared] });
    let root = src.insert(Cell { label: "root", next: vec![a, b] });

    let mut dst = Arena::new();
    let mut map = CopyMap::new();
    let root2 = src.deep_copy_into(root, &mut dst, &mut map).unwrap();

    // 1. 每个可达对象恰好复制一次
    assert_eq!(dst.len(), 4);
    assert_eq!(map.len(), 4);

    // 2. a'与b'指向同一个shared'
    let root_copy = dst.get(root2).unwrap();
    assert_eq!(root_copy.label, "root");
    let a2 = dst.get(root_copy.next[0]).unwrap();
    let b2 = dst.get(root_copy.next[1]).unwrap();
    assert_eq!(a2.label, "a");
    assert_eq!(b2.label, "b");
    assert_eq!(a2.next[0], b2.next[0]);
    assert_eq!(dst.get(a2.next[0]).unwrap().label, "shared");
}

#[test]
fn test_deep_copy_terminates_on_cycle() {
    let mut src = Arena::new();
    let x = src.insert(cell("x"));
    let y = src.insert(Cell { label: "y", next: vec![x] });
    src.get_mut(x).unwrap().next.push(y);

    let mut dst = Arena::new();
    let mut map = CopyMap::new();
    let x2 = src.deep_copy_into(x, &mut dst, &mut map).unwrap();

    assert_eq!(dst.len(), 2);
    let y2 = dst.get(x2).unwrap().next[0];
    assert_eq!(dst.get(y2).unwrap().label, "y");
    // 环结构保留：y' -> x'
    assert_eq!(dst.get(y2).unwrap().next[0], x2);
}

#[test]
fn test_deep_copy_reuses_existing_map_entries() {
    let mut src = Arena::new();
    let shared = src.insert(cell("shared"));
    let a = src.insert(Cell { label: "a", next: vec![shared] });
    let b = src.insert(Cell { label: "b", next: vec![shared] });

    // 两次独立的拷贝共用一张映射表时，共享对象仍只复制一次
    let mut dst = Arena::new();
    let mut map = CopyMap::new();
    let a2 = src.deep_copy_into(a, &mut dst, &mut map).unwrap();
    let b2 = src.deep_copy_into(b, &mut dst, &mut map).unwrap();
    assert_eq!(dst.len(), 3);
    assert_eq!(dst.get(a2).unwrap().next[0], dst.get(b2).unwrap().next[0]);
    // 再次拷贝已复制过的根，直接返回已有副本
    assert_eq!(src.deep_copy_into(a, &mut dst, &mut map).unwrap(), a2);
    assert_eq!(dst.len(), 3);
}

#[test]
fn test_deep_copy_dangling_handle() {
    let mut src = Arena::new();
    let bad = src.insert(Cell { label: "bad", next: vec![Handle(99)] });
    let mut dst = Arena::new();
    let mut map = CopyMap::new();
    assert_eq!(
        src.deep_copy_into(bad, &mut dst, &mut map),
        Err(ObjectError::DanglingHandle(Handle(99)))
    );
}

#[test]
fn test_arena_clone_gets_new_identity() {
    let mut src = Arena::new();
    let h = src.insert(cell("only"));
    let copy = src.clone();
    assert_ne!(copy.id(), src.id());
    assert_eq!(copy.get(h), src.get(h));

    // 不同arena中相同的句柄不会在映射表中冲突
    let mut map = CopyMap::new();
    map.insert(&src, h, Handle(5));
    assert_eq!(map.get(&copy, h), None);
    assert_eq!(map.get(&src, h), Some(Handle(5)));
}
