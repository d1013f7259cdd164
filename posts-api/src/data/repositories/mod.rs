pub(crate) mod memory;
pub(crate) mod mongo;
