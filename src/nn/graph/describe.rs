use super::{Graph, GraphError};
use crate::nn::descriptor::{GraphDescriptor, NodeDescriptor};
use crate::nn::nodes::NodeType;

impl Graph {
    /// 生成图的可序列化描述
    pub fn describe(&self) -> GraphDescriptor {
        GraphDescriptor {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: self.name.clone(),
            nodes: self
                .arena()
                .iter()
                .map(|(id, node)| NodeDescriptor {
                    id: id.0,
                    name: node.name().to_string(),
                    node_type: node.type_name().to_string(),
                    cols: node.cols(),
                    parents: node.parents().iter().map(|p| p.0).collect(),
                    param_count: match node.raw() {
                        NodeType::Parameter(_) => node.value().map(|v| v.size()),
                        _ => None,
                    },
                })
                .collect(),
        }
    }

    /// 以 JSON 形式输出图描述（调试用）
    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(&self.describe())
            .map_err(|e| GraphError::ComputationError(format!("图描述序列化失败：{e}")))
    }
}
