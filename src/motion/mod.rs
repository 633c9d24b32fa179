pub(crate) mod orbit;
pub(crate) mod period;
