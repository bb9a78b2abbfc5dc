//! Cross-crate flows exercised over HTTP.

#[cfg(test)]
pub(crate) mod harness;

#[cfg(test)]
mod access;
#[cfg(test)]
mod pickup_flow;
#[cfg(test)]
mod realtime;
