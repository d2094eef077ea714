pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod summary;
pub(crate) mod sync;
