//! Daraja (M-Pesa) outbound adapter implementing the `PaymentGateway` port.

mod dto;
mod http_gateway;

pub use http_gateway::{DarajaCredentials, DarajaHttpGateway};
