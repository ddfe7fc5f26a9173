/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 基于句柄的对象仓库（arena）与深拷贝。
 *                 对象之间的引用一律用句柄表示，允许共享与环；深拷贝时通过“旧句柄 -> 新句柄”的映射表
 *                 保证同一个对象只被复制一次，共享关系（含环）在副本中原样保留。
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::error::ObjectError;

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

fn next_arena_id() -> u64 {
    NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed)
}

/// arena 中某个槽位的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub usize);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 持有对象之间链接的类型：能列出自己指向的句柄，也能按映射表改写这些句柄
pub trait Relink {
    fn links(&self) -> Vec<Handle>;

    fn relink<F>(&mut self, map: F) -> Result<(), ObjectError>
    where
        F: Fn(Handle) -> Result<Handle, ObjectError>;
}

/// 深拷贝过程中的“已复制”记录。键中带有 arena 的标识，因此同一张表可以贯穿多个 arena
#[derive(Debug, Default, Clone)]
pub struct CopyMap {
    copied: HashMap<(u64, Handle), Handle>,
}

impl CopyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T>(&self, src: &Arena<T>, handle: Handle) -> Option<Handle> {
        self.copied.get(&(src.id, handle)).copied()
    }

    pub fn insert<T>(&mut self, src: &Arena<T>, from: Handle, to: Handle) {
        self.copied.insert((src.id, from), to);
    }

    pub fn len(&self) -> usize {
        self.copied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }
}

#[derive(Debug)]
pub struct Arena<T> {
    id: u64,
    slots: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 克隆得到的是一个新的 arena（新标识），槽位一一对应，所以原有句柄在副本中依然有效
impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        Self {
            id: next_arena_id(),
            slots: self.slots.clone(),
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            id: next_arena_id(),
            slots: Vec::new(),
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.slots.push(value);
        Handle(self.slots.len() - 1)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        handle.0 < self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        (0..self.slots.len()).map(Handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().map(|(i, v)| (Handle(i), v))
    }
}

impl<T: Clone + Relink> Arena<T> {
    /// 把`root`及其可达的全部对象复制到`dst`中，返回`root`副本的句柄。
    /// `map`中已有的对象不再复制，直接复用其副本
    pub fn deep_copy_into(
        &self,
        root: Handle,
        dst: &mut Arena<T>,
        map: &mut CopyMap,
    ) -> Result<Handle, ObjectError> {
        let mut created = Vec::new();
        let mut stack = vec![root];

        // 1. 先登记：副本在递归访问其链接之前就放进映射表，环因此能终止
        while let Some(handle) = stack.pop() {
            if map.get(self, handle).is_some() {
                continue;
            }
            let value = self.get(handle).ok_or(ObjectError::DanglingHandle(handle))?;
            let copy = dst.insert(value.clone());
            map.insert(self, handle, copy);
            created.push(copy);
            stack.extend(value.links());
        }

        // 2. 再把新副本中的链接改写为副本句柄
        for copy in created {
            let node = dst
                .get_mut(copy)
                .ok_or(ObjectError::DanglingHandle(copy))?;
            node.relink(|old| map.get(self, old).ok_or(ObjectError::DanglingHandle(old)))?;
        }

        map.get(self, root).ok_or(ObjectError::DanglingHandle(root))
    }
}
