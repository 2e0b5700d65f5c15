//! HTTP surface tests against the production router.

mod gateway_tests;
mod health_tests;
mod rest_tests;
