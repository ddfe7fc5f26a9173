use crate::nn::nodes::raw_node::{class_index, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 按下标取出表中的行（嵌入查找）
///
/// 父节点 0 为表 [R, m]，父节点 1 为下标 [B, 1]；输出 [B, m]。
/// 对表的梯度只触及被选中的行，这正是部分更新参数所需的信息
#[derive(Debug, Clone, Default)]
pub(crate) struct RowSelect;

fn indices(node: &str, table: &Tensor, idx: &Tensor) -> Result<Vec<usize>, GraphError> {
    (0..idx.rows())
        .map(|r| class_index(node, idx.get(r, 0), table.rows()))
        .collect()
}

impl TraitNode for RowSelect {
    fn type_name(&self) -> &'static str {
        "RowSelect"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (table, idx) = (parents[0], parents[1]);
        let rows = indices(node, table, idx)?;
        let mut out = Tensor::zeros(&[rows.len(), table.cols()]);
        for (r, &i) in rows.iter().enumerate() {
            for c in 0..table.cols() {
                out.set(r, c, table.get(i, c));
            }
        }
        Ok(out)
    }

    fn calc_grad_to_parents(
        &self,
        node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let (table, idx) = (parents[0], parents[1]);
        let rows = indices(node, table, idx)?;
        let mut dtable = Tensor::zeros(table.shape());
        for (r, &i) in rows.iter().enumerate() {
            for c in 0..table.cols() {
                dtable.set(i, c, dtable.get(i, c) + upstream.get(r, c));
            }
        }
        Ok(vec![Some(dtable), None])
    }

    fn touched_rows(&self, parent_index: usize, parents: &[&Tensor]) -> Option<Vec<usize>> {
        if parent_index != 0 {
            return None;
        }
        let idx = parents[1];
        Some((0..idx.rows()).map(|r| idx.get(r, 0) as usize).collect())
    }
}
