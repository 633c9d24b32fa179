pub(crate) mod color;
pub(crate) mod handle;
