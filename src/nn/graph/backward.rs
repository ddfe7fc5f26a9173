use std::collections::HashMap;

use super::{Graph, GraphError};
use crate::nn::nodes::{NodeType, TraitNode};
use crate::nn::NodeId;
use crate::tensor::Tensor;

impl Graph {
    /// 反向传播：以`loss`（必须是已前向计算过的标量）为起点，逆着传播路径把链式法则的贡献
    /// 累加到各节点的梯度上。每条“父节点 -> 子节点”的边恰好贡献一次。
    ///
    /// 梯度是累加而非覆盖的，开始新一轮反向传播前应先调用`clear_gradients`
    pub fn bprop(&mut self, loss: NodeId) -> Result<(), GraphError> {
        let loss_node = self.get_node(loss)?;
        match loss_node.value() {
            None => {
                return Err(GraphError::InvalidOperation(format!(
                    "{loss_node}没有值，反向传播前需先前向传播"
                )));
            }
            Some(v) if v.shape() != [1, 1] => {
                return Err(GraphError::InvalidOperation(format!(
                    "反向传播的起点{loss_node}必须是标量，实际形状为{:?}",
                    v.shape()
                )));
            }
            Some(_) => {}
        }

        let path = self.propagation_path(&[loss])?;
        // 本轮的梯度先记在局部表中，结束时再累加到节点上，多轮之间互不放大
        let mut pass: HashMap<NodeId, Tensor> = HashMap::new();
        pass.insert(loss, Tensor::scalar(1.0));

        for &id in path.iter().rev() {
            let node = self.get_node(id)?;
            if node.is_leaf() {
                continue;
            }
            let Some(upstream) = pass.get(&id) else {
                continue;
            };
            let value = node.value().ok_or_else(|| {
                GraphError::ComputationError(format!("{node}没有值，反向传播前需先前向传播"))
            })?;
            let label = node.to_string();
            let parent_values = self.parent_values(node)?;
            let grads = node
                .raw()
                .calc_grad_to_parents(&label, &parent_values, value, upstream)?;

            let mut contributions = Vec::with_capacity(grads.len());
            for (i, grad) in grads.into_iter().enumerate() {
                let Some(grad) = grad else { continue };
                let parent = node.parents()[i];
                if grad.shape() != parent_values[i].shape() {
                    return Err(GraphError::ShapeMismatch {
                        node: self.get_node(parent)?.to_string(),
                        expected: parent_values[i].shape().to_vec(),
                        got: grad.shape().to_vec(),
                    });
                }
                let touched = node.raw().touched_rows(i, &parent_values);
                contributions.push((parent, grad, touched));
            }

            for (parent, grad, touched) in contributions {
                let parent_node = self.get_node_mut(parent)?;
                if let NodeType::Parameter(p) = parent_node.raw() {
                    if p.partial_update() {
                        match touched {
                            Some(rows) => parent_node.touch_rows(rows),
                            None => {
                                let rows = grad.rows();
                                parent_node.touch_rows(0..rows);
                            }
                        }
                    }
                }
                match pass.get_mut(&parent) {
                    Some(acc) => *acc += &grad,
                    None => {
                        pass.insert(parent, grad);
                    }
                }
            }
        }

        for (id, grad) in pass {
            self.get_node_mut(id)?.accumulate_grad(&grad);
        }
        self.last_backward_pass_id += 1;
        Ok(())
    }

    /// 清空所有节点的梯度（以及部分更新参数的“已触及行”记录）
    pub fn clear_gradients(&mut self) {
        for id in self.nodes() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.clear_grad();
            }
        }
    }
}
