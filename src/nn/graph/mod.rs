/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 计算图：节点存放在图独占的 arena 中，节点之间以句柄相连。
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 基础访问 + 传播路径 + fprop
 * - backward.rs: bprop（梯度累积）与部分更新信息
 * - node_builders.rs: new_*_node
 * - copy.rs: 深拷贝 / 子图压缩
 * - describe.rs: 图描述（JSON）
 */

mod backward;
mod copy;
mod core;
mod describe;
mod error;
mod node_builders;

pub use error::GraphError;

use std::collections::HashMap;

use crate::nn::nodes::NodeHandle;
use crate::nn::NodeId;
use crate::object::Arena;

/// 计算图
///
/// 图独占其全部节点；外部只拿到`NodeId`，并通过只读视图访问值与梯度
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    nodes: Arena<NodeHandle>,
    node_names: HashMap<String, NodeId>,
    /// 每种节点类型已自动命名的个数（用于生成`tanh_1`这样的名字）
    type_counts: HashMap<&'static str, usize>,
    /// 图结构每变化一次（新增节点）就加一，传播路径缓存据此失效
    structure_version: u64,
    path_cache: HashMap<Vec<NodeId>, (u64, Vec<NodeId>)>,
    /// 传播路径实际被（重新）计算的次数
    path_builds: usize,
    last_forward_pass_id: u64,
    last_backward_pass_id: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
