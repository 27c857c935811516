#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod case;
pub mod entity;
pub mod error;
pub mod filtering;
#[cfg(feature = "wiremock")]
#[cfg_attr(docsrs, doc(cfg(feature = "wiremock")))]
pub mod mock;
pub mod operators;
pub mod query;

pub use crate::entity::{Entity, Model, Relation};
pub use crate::error::FilterError;
pub use crate::filtering::{Filter, FilterSet, FilterValue, OperatorFilter};
pub use crate::operators::{Condition, Operator};
pub use crate::query::{QueryBuilder, SqlQuery};
pub use filter_operator_derive::Model;
