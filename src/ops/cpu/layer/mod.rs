pub mod activation;
pub mod conv;
