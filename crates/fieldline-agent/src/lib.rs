//! Field-technician side of fieldline: timeline gateway client, serialized
//! append outbox, ETA countdown task, and the per-request session that
//! drives stage transitions through the confirmation gates.

pub mod countdown;
pub mod gateway;
pub mod outbox;
pub mod session;
