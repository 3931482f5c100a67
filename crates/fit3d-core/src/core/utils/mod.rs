//! Small, stateless helpers shared by the I/O layer and the engine: atom-name
//! classification ([`identifiers`]) and point-set geometry ([`geometry`]).

pub mod geometry;
pub mod identifiers;
