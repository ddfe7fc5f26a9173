mod node_handle;
mod raw_node;

pub use node_handle::NodeId;
pub(crate) use node_handle::NodeHandle;
pub use raw_node::BagCombiner;
pub(crate) use raw_node::*;
