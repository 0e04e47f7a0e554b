//! Safe smart account contract bindings and canonical deployment addresses.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub(crate) use alloy_sol_types::sol;

pub mod addresses;
pub mod contracts;

pub use addresses::{EntryPointVersion, SafeDeployment};
pub use contracts::*;
