pub mod booking;
pub mod hunt;
pub mod roster;
pub mod router;

#[cfg(test)]
pub(crate) mod testutil;
