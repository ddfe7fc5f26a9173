/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 图描述符（Graph Descriptor）：用于调试输出的可序列化中间表示
 */

use serde::{Deserialize, Serialize};

/// 图的可序列化描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    /// 格式版本
    pub version: String,
    pub name: String,
    pub nodes: Vec<NodeDescriptor>,
}

/// 节点描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: usize,
    pub name: String,
    pub node_type: String,
    /// 每行的列数
    pub cols: usize,
    /// 父节点 ID 列表（定义拓扑）
    pub parents: Vec<usize>,
    /// 参数数量（仅 Parameter 类型有意义）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_count: Option<usize>,
}

impl GraphDescriptor {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 参数总数
    pub fn total_params(&self) -> usize {
        self.nodes.iter().filter_map(|n| n.param_count).sum()
    }
}
