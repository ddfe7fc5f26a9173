mod add;
mod affine;
mod bag_reduce;
mod concat;
mod exp;
mod log_softmax;
mod row_select;
mod sigmoid;
mod softmax;
mod softplus;
mod tanh;
mod weight_penalty;
mod weighted_mean;

pub(crate) use add::Add;
pub(crate) use affine::Affine;
pub use bag_reduce::BagCombiner;
pub(crate) use bag_reduce::BagReduce;
pub(crate) use concat::Concat;
pub(crate) use exp::Exp;
pub(crate) use log_softmax::LogSoftmax;
pub(crate) use row_select::RowSelect;
pub(crate) use sigmoid::Sigmoid;
pub(crate) use softmax::Softmax;
pub(crate) use softplus::Softplus;
pub(crate) use tanh::Tanh;
pub(crate) use weight_penalty::WeightPenalty;
pub(crate) use weighted_mean::WeightedMean;
