use std::collections::BTreeSet;
use std::fmt;

use super::raw_node::{NodeType, TraitNode};
use crate::object::{Handle, ObjectError, Relink};
use crate::tensor::Tensor;

/// 图中节点的标识，即节点在图的 arena 中的句柄
pub type NodeId = Handle;

/// 图中的一个节点：值、累积梯度、父节点链接，以及具体的前向/反向规则
#[derive(Debug, Clone)]
pub(crate) struct NodeHandle {
    id: NodeId,
    name: String,
    parents: Vec<NodeId>,
    /// 每行的列数；行数随 batch 变化（参数节点除外）
    cols: usize,
    value: Option<Tensor>,
    grad: Option<Tensor>,
    /// 部分更新的参数：本次反向传播中被触及的行
    touched_rows: BTreeSet<usize>,
    raw_node: NodeType,
}

impl NodeHandle {
    pub(crate) fn new<T: Into<NodeType>>(
        id: NodeId,
        name: &str,
        parents: Vec<NodeId>,
        cols: usize,
        raw_node: T,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            parents,
            cols,
            value: None,
            grad: None,
            touched_rows: BTreeSet::new(),
            raw_node: raw_node.into(),
        }
    }

    pub(crate) const fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub(crate) const fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) const fn raw(&self) -> &NodeType {
        &self.raw_node
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.raw_node.type_name()
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.raw_node.is_leaf()
    }

    pub(crate) fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: Option<Tensor>) {
        self.value = value;
    }

    pub(crate) fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    /// 累加（而非覆盖）一份梯度贡献
    pub(crate) fn accumulate_grad(&mut self, contribution: &Tensor) {
        match &mut self.grad {
            Some(grad) => *grad += contribution,
            None => self.grad = Some(contribution.clone()),
        }
    }

    pub(crate) fn clear_grad(&mut self) {
        self.grad = None;
        self.touched_rows.clear();
    }

    pub(crate) fn touched_rows(&self) -> &BTreeSet<usize> {
        &self.touched_rows
    }

    pub(crate) fn touch_rows(&mut self, rows: impl IntoIterator<Item = usize>) {
        self.touched_rows.extend(rows);
    }

    /// 同时借出值（可变）与梯度（只读），供优化器更新参数
    pub(crate) fn value_mut_and_grad(&mut self) -> (Option<&mut Tensor>, Option<&Tensor>) {
        (self.value.as_mut(), self.grad.as_ref())
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "节点[id={}, name={}, type={}]",
            self.id.0,
            self.name,
            self.type_name()
        )
    }
}

impl Relink for NodeHandle {
    fn links(&self) -> Vec<Handle> {
        self.parents.clone()
    }

    fn relink<F>(&mut self, map: F) -> Result<(), ObjectError>
    where
        F: Fn(Handle) -> Result<Handle, ObjectError>,
    {
        for parent in &mut self.parents {
            *parent = map(*parent)?;
        }
        Ok(())
    }
}
