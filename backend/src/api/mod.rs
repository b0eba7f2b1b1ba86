pub mod error;
pub mod market;
pub mod rest;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;
