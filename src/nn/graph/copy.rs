use std::collections::HashMap;

use super::{Graph, GraphError};
use crate::nn::NodeId;
use crate::object::{Arena, CopyMap};

impl Graph {
    /// 深拷贝整张图。`map`记录“原节点 -> 副本节点”，调用方据此改写自己持有的`NodeId`
    pub fn deep_copy(&self, map: &mut CopyMap) -> Result<Graph, GraphError> {
        self.copy_nodes(&self.nodes(), map)
    }

    /// 只复制`roots`及其全部祖先组成的子图；其余节点（不再被引用的旧结构）被丢弃
    pub fn deep_copy_subgraph(&self, roots: &[NodeId], map: &mut CopyMap) -> Result<Graph, GraphError> {
        self.copy_nodes(roots, map)
    }

    /// 查询原图节点在副本中的对应节点
    pub fn copied_id(&self, map: &CopyMap, id: NodeId) -> Result<NodeId, GraphError> {
        map.get(&self.nodes, id).ok_or(GraphError::NodeNotFound(id))
    }

    fn copy_nodes(&self, roots: &[NodeId], map: &mut CopyMap) -> Result<Graph, GraphError> {
        let mut nodes = Arena::new();
        for &root in roots {
            self.nodes.deep_copy_into(root, &mut nodes, map)?;
        }

        let mut node_names = HashMap::new();
        for id in nodes.handles().collect::<Vec<_>>() {
            if let Some(node) = nodes.get_mut(id) {
                node.set_id(id);
                node_names.insert(node.name().to_string(), id);
            }
        }

        Ok(Graph {
            name: self.name.clone(),
            nodes,
            node_names,
            type_counts: self.type_counts.clone(),
            structure_version: 0,
            path_cache: HashMap::new(),
            path_builds: 0,
            last_forward_pass_id: 0,
            last_backward_pass_id: 0,
        })
    }
}
