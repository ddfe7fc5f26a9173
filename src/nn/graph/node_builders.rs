use super::{Graph, GraphError};
use crate::nn::nodes::{
    Add, Affine, BagCombiner, BagReduce, ClassError, Concat, CrossEntropy, Exp, Input, LogSoftmax,
    MarginPerceptron, NegLogLikelihood, NodeHandle, NodeType, Parameter, RowSelect, Sigmoid,
    Softmax, Softplus, SquaredError, Tanh, WeightPenalty, WeightedMean,
};
use crate::nn::NodeId;
use crate::object::Handle;
use crate::tensor::Tensor;

impl Graph {
    fn generate_node_name(&mut self, prefix: &'static str) -> String {
        loop {
            let count = self.type_counts.entry(prefix).or_insert(0);
            *count += 1;
            let name = format!("{prefix}_{count}");
            if !self.node_names.contains_key(&name) {
                return name;
            }
        }
    }

    fn add_node<T: Into<NodeType>>(
        &mut self,
        raw: T,
        parents: Vec<NodeId>,
        cols: usize,
        name: Option<&str>,
        prefix: &'static str,
    ) -> Result<NodeId, GraphError> {
        for &p in &parents {
            self.get_node(p)?;
        }
        let name = match name {
            Some(name) => {
                if self.node_names.contains_key(name) {
                    return Err(GraphError::DuplicateNodeName(name.to_string()));
                }
                name.to_string()
            }
            None => self.generate_node_name(prefix),
        };

        let id = Handle(self.nodes.len());
        let inserted = self
            .nodes
            .insert(NodeHandle::new(id, &name, parents, cols, raw));
        debug_assert_eq!(id, inserted);
        self.node_names.insert(name, inserted);
        self.structure_version += 1;
        Ok(inserted)
    }

    fn expect_cols(&self, id: NodeId, expected: usize) -> Result<(), GraphError> {
        let node = self.get_node(id)?;
        if node.cols() != expected {
            return Err(GraphError::ShapeMismatch {
                node: node.to_string(),
                expected: vec![1, expected],
                got: vec![1, node.cols()],
            });
        }
        Ok(())
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓叶子节点↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 输入节点，每行`cols`列，行数在绑定数据时确定
    pub fn new_input_node(&mut self, cols: usize, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_node(Input, vec![], cols, name, "input")
    }

    /// 以`value`为初值的参数节点
    pub fn new_parameter_node(
        &mut self,
        value: &Tensor,
        partial_update: bool,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let id = self.add_node(
            Parameter::new(partial_update),
            vec![],
            value.cols(),
            name,
            "parameter",
        )?;
        self.get_node_mut(id)?.set_value(Some(value.clone()));
        Ok(id)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑叶子节点↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓运算节点↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 仿射变换 x·W[1..] + W[0]；`weights`的行数须为`x`的列数加 1
    pub fn new_affine_node(
        &mut self,
        x: NodeId,
        weights: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let x_cols = self.get_node_cols(x)?;
        let w = self.get_node(weights)?;
        if let Some(value) = w.value() {
            if value.rows() != x_cols + 1 {
                return Err(GraphError::ShapeMismatch {
                    node: w.to_string(),
                    expected: vec![x_cols + 1, w.cols()],
                    got: value.shape().to_vec(),
                });
            }
        }
        let cols = w.cols();
        self.add_node(Affine, vec![x, weights], cols, name, "affine")
    }

    pub fn new_add_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        let cols = self.get_node_cols(a)?;
        self.expect_cols(b, cols)?;
        self.add_node(Add, vec![a, b], cols, name, "add")
    }

    fn new_unary_node<T: Into<NodeType>>(
        &mut self,
        raw: T,
        x: NodeId,
        name: Option<&str>,
        prefix: &'static str,
    ) -> Result<NodeId, GraphError> {
        let cols = self.get_node_cols(x)?;
        self.add_node(raw, vec![x], cols, name, prefix)
    }

    pub fn new_tanh_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.new_unary_node(Tanh, x, name, "tanh")
    }

    pub fn new_sigmoid_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.new_unary_node(Sigmoid, x, name, "sigmoid")
    }

    pub fn new_softplus_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.new_unary_node(Softplus, x, name, "softplus")
    }

    pub fn new_exp_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.new_unary_node(Exp, x, name, "exp")
    }

    pub fn new_softmax_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.new_unary_node(Softmax, x, name, "softmax")
    }

    pub fn new_log_softmax_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.new_unary_node(LogSoftmax, x, name, "log_softmax")
    }

    /// 按列拼接
    pub fn new_concat_node(&mut self, parts: &[NodeId], name: Option<&str>) -> Result<NodeId, GraphError> {
        if parts.is_empty() {
            return Err(GraphError::InvalidOperation(
                "Concat节点至少需要1个父节点".to_string(),
            ));
        }
        let cols = parts
            .iter()
            .map(|&p| self.get_node_cols(p))
            .sum::<Result<usize, _>>()?;
        self.add_node(Concat, parts.to_vec(), cols, name, "concat")
    }

    /// 按`indices`（单列下标）从`table`中取行
    pub fn new_row_select_node(
        &mut self,
        table: NodeId,
        indices: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.expect_cols(indices, 1)?;
        let cols = self.get_node_cols(table)?;
        self.add_node(RowSelect, vec![table, indices], cols, name, "row_select")
    }

    /// 按样本权重求均值；`weights`为`None`时等权
    pub fn new_weighted_mean_node(
        &mut self,
        x: NodeId,
        weights: Option<NodeId>,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.expect_cols(x, 1)?;
        let mut parents = vec![x];
        if let Some(w) = weights {
            self.expect_cols(w, 1)?;
            parents.push(w);
        }
        self.add_node(WeightedMean, parents, 1, name, "weighted_mean")
    }

    pub fn new_weight_penalty_node(
        &mut self,
        params: &[NodeId],
        weight_decay: f64,
        bias_decay: f64,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_node(
            WeightPenalty::new(weight_decay, bias_decay),
            params.to_vec(),
            1,
            name,
            "weight_penalty",
        )
    }

    /// 把一个包的逐实例输出合并为包级输出（输出恒为 1 行）
    pub fn new_bag_reduce_node(
        &mut self,
        x: NodeId,
        combiner: BagCombiner,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_unary_node(BagReduce::new(combiner), x, name, "bag_reduce")
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑运算节点↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓代价节点（逐行，输出[B, 1]）↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 平方误差；`onehot`为真时`target`为单列类别下标
    pub fn new_squared_error_node(
        &mut self,
        output: NodeId,
        target: NodeId,
        onehot: bool,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let target_cols = if onehot { 1 } else { self.get_node_cols(output)? };
        self.expect_cols(target, target_cols)?;
        self.add_node(SquaredError::new(onehot), vec![output, target], 1, name, "squared_error")
    }

    pub fn new_cross_entropy_node(
        &mut self,
        output: NodeId,
        target: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let cols = self.get_node_cols(output)?;
        self.expect_cols(target, cols)?;
        self.add_node(CrossEntropy, vec![output, target], 1, name, "cross_entropy")
    }

    pub fn new_nll_node(&mut self, output: NodeId, target: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.expect_cols(target, 1)?;
        self.add_node(NegLogLikelihood, vec![output, target], 1, name, "nll")
    }

    pub fn new_class_error_node(
        &mut self,
        output: NodeId,
        target: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.expect_cols(target, 1)?;
        self.add_node(ClassError, vec![output, target], 1, name, "class_error")
    }

    pub fn new_margin_perceptron_node(
        &mut self,
        output: NodeId,
        target: NodeId,
        margin: f64,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.expect_cols(target, 1)?;
        self.add_node(
            MarginPerceptron::new(margin),
            vec![output, target],
            1,
            name,
            "margin_perceptron",
        )
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑代价节点↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}
