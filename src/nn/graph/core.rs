use std::collections::{BTreeSet, HashMap, HashSet};

use super::{Graph, GraphError};
use crate::nn::nodes::{NodeHandle, NodeType, TraitNode};
use crate::nn::NodeId;
use crate::object::Arena;
use crate::tensor::Tensor;

impl Graph {
    pub fn new() -> Self {
        Self::with_name("default_graph")
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Arena::new(),
            node_names: HashMap::new(),
            type_counts: HashMap::new(),
            structure_version: 0,
            path_cache: HashMap::new(),
            path_builds: 0,
            last_forward_pass_id: 0,
            last_backward_pass_id: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.handles().collect()
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub const fn structure_version(&self) -> u64 {
        self.structure_version
    }

    /// 传播路径被实际计算（而非取自缓存）的次数
    pub const fn path_builds(&self) -> usize {
        self.path_builds
    }

    pub const fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub const fn last_backward_pass_id(&self) -> u64 {
        self.last_backward_pass_id
    }

    pub(in crate::nn) fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn arena(&self) -> &Arena<NodeHandle> {
        &self.nodes
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_names.get(name).copied()
    }

    pub fn get_node_type(&self, id: NodeId) -> Result<&'static str, GraphError> {
        Ok(self.get_node(id)?.type_name())
    }

    pub fn get_node_parents(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self.get_node(id)?.parents().to_vec())
    }

    pub fn get_node_children(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.get_node(id)?;
        Ok(self
            .nodes
            .iter()
            .filter(|(_, n)| n.parents().contains(&id))
            .map(|(child, _)| child)
            .collect())
    }

    /// 节点每行的列数
    pub fn get_node_cols(&self, id: NodeId) -> Result<usize, GraphError> {
        Ok(self.get_node(id)?.cols())
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    pub fn get_node_grad(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.grad())
    }

    /// 所有参数节点，按创建顺序
    pub fn get_parameter_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n.raw(), NodeType::Parameter(_)))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn is_partial_update(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(match self.get_node(id)?.raw() {
            NodeType::Parameter(p) => p.partial_update(),
            _ => false,
        })
    }

    /// 部分更新参数在最近一次反向传播中被触及的行
    pub fn get_touched_rows(&self, id: NodeId) -> Result<&BTreeSet<usize>, GraphError> {
        Ok(self.get_node(id)?.touched_rows())
    }

    /// 为叶子节点（输入或参数）赋值
    ///
    /// - 输入节点：行数任意（batch 大小），列数必须与声明一致
    /// - 参数节点：形状必须与原值完全一致
    pub fn set_node_value(&mut self, id: NodeId, value: &Tensor) -> Result<(), GraphError> {
        let node = self.get_node_mut(id)?;
        match node.raw() {
            NodeType::Input(_) => {
                if value.cols() != node.cols() {
                    return Err(GraphError::ShapeMismatch {
                        node: node.to_string(),
                        expected: vec![value.rows(), node.cols()],
                        got: value.shape().to_vec(),
                    });
                }
            }
            NodeType::Parameter(_) => {
                let expected = node.value().map(|v| v.shape().to_vec());
                if let Some(expected) = expected {
                    if expected != value.shape() {
                        return Err(GraphError::ShapeMismatch {
                            node: node.to_string(),
                            expected,
                            got: value.shape().to_vec(),
                        });
                    }
                }
            }
            _ => {
                return Err(GraphError::InvalidOperation(format!(
                    "{node}的值由父节点计算得到，不应该被手动设置"
                )));
            }
        }
        node.set_value(Some(value.clone()));
        Ok(())
    }

    /// 参数节点的可变值与只读梯度（以及部分更新时被触及的行），供优化器使用。
    /// 没有梯度时不调用`update`
    pub fn update_parameter<F>(&mut self, id: NodeId, update: F) -> Result<(), GraphError>
    where
        F: FnOnce(&mut Tensor, &Tensor, Option<&BTreeSet<usize>>),
    {
        let partial = self.is_partial_update(id)?;
        let node = self.get_node_mut(id)?;
        if !matches!(node.raw(), NodeType::Parameter(_)) {
            return Err(GraphError::InvalidOperation(format!("{node}不是参数节点")));
        }
        let touched = partial.then(|| node.touched_rows().clone());
        let (value, grad) = node.value_mut_and_grad();
        if let (Some(value), Some(grad)) = (value, grad) {
            update(value, grad, touched.as_ref());
        }
        Ok(())
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓传播路径↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 从源节点到`sinks`的拓扑序：每个节点都排在它的所有父节点之后。
    /// 按汇点集合缓存；图结构改变后自动重新计算
    pub fn propagation_path(&mut self, sinks: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        if let Some((version, path)) = self.path_cache.get(sinks) {
            if *version == self.structure_version {
                return Ok(path.clone());
            }
        }

        let mut path = Vec::new();
        let mut done: HashSet<NodeId> = HashSet::new();
        // 迭代式后序遍历：(节点, 父节点是否已展开)
        let mut stack: Vec<(NodeId, bool)> = sinks.iter().rev().map(|&s| (s, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if done.contains(&id) {
                continue;
            }
            if expanded {
                done.insert(id);
                path.push(id);
                continue;
            }
            let node = self.get_node(id)?;
            stack.push((id, true));
            for &parent in node.parents().iter().rev() {
                if !done.contains(&parent) {
                    stack.push((parent, false));
                }
            }
        }

        self.path_builds += 1;
        self.path_cache
            .insert(sinks.to_vec(), (self.structure_version, path.clone()));
        Ok(path)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑传播路径↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 沿传播路径对`sinks`做一次前向计算：路径上每个非叶子节点恰好计算一次
    pub fn fprop(&mut self, sinks: &[NodeId]) -> Result<(), GraphError> {
        let path = self.propagation_path(sinks)?;
        for id in path {
            let node = self.get_node(id)?;
            if node.is_leaf() {
                if node.value().is_none() {
                    return Err(GraphError::InvalidOperation(format!(
                        "{node}没有值，前向传播前需先通过set_node_value为其赋值"
                    )));
                }
                continue;
            }

            let label = node.to_string();
            let parent_values = self.parent_values(node)?;
            let value = node.raw().calc_value_by_parents(&label, &parent_values)?;
            if value.cols() != node.cols() {
                return Err(GraphError::ShapeMismatch {
                    node: label,
                    expected: vec![value.rows(), node.cols()],
                    got: value.shape().to_vec(),
                });
            }
            self.get_node_mut(id)?.set_value(Some(value));
        }
        self.last_forward_pass_id += 1;
        Ok(())
    }

    /// 绑定输入、前向计算，并返回各汇点的值
    pub fn evaluate(
        &mut self,
        inputs: &[(NodeId, &Tensor)],
        sinks: &[NodeId],
    ) -> Result<Vec<Tensor>, GraphError> {
        for &(id, value) in inputs {
            self.set_node_value(id, value)?;
        }
        self.fprop(sinks)?;
        sinks
            .iter()
            .map(|&s| {
                self.get_node_value(s)?
                    .cloned()
                    .ok_or_else(|| GraphError::ComputationError(format!("汇点{s}没有值")))
            })
            .collect()
    }

    pub(in crate::nn::graph) fn parent_values<'a>(
        &'a self,
        node: &NodeHandle,
    ) -> Result<Vec<&'a Tensor>, GraphError> {
        node.parents()
            .iter()
            .map(|&p| {
                let parent = self.get_node(p)?;
                parent.value().ok_or_else(|| {
                    GraphError::ComputationError(format!(
                        "{node}的父节点{parent}没有值。不该触及本错误，否则说明crate代码有问题"
                    ))
                })
            })
            .collect()
    }
}
