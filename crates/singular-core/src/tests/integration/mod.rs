#![cfg(test)]

mod concurrency_tests;
mod config_tests;
mod event_tests;
mod scenario_tests;
mod weak_tests;
