pub(crate) mod driver;
pub(crate) mod element;
pub(crate) mod reconcile;
pub(crate) mod scheduler;
