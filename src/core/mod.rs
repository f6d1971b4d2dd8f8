pub mod etl;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{Record, Table};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
