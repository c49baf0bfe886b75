pub mod dirty;
pub mod next;
pub mod record;
pub mod simulate;
pub mod status;
