pub mod authentication;
pub mod bootstrap;
pub mod configuration;
pub mod cors;
pub mod domain;
pub mod email_client;
pub mod emails;
mod error_handling;
pub mod models;
pub mod pages;
pub mod proxy;
pub mod request_transaction;
pub mod routes;
pub mod startup;
pub mod telemetry;
