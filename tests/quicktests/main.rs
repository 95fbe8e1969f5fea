//! Property tests replaying random operations against `std::collections::BTreeMap`.

mod ops;
mod ranked;

pub(crate) use ops::Op;
