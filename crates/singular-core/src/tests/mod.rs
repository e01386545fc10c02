pub(crate) mod common;
mod integration;
