mod article;
mod topic;
mod stats;
pub use self::{
  article::*,
  topic::*,
  stats::*,
};
