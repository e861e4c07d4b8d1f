pub mod encoder;
pub mod stream;

#[cfg(test)]
pub(crate) mod fakes;
