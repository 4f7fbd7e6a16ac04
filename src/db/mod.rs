pub mod util;
pub mod query;

mod article;
mod topic;
pub use self::{
  article::*,
  topic::*,
};

mod service;
pub use service::*;
