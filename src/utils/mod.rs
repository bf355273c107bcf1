pub mod address;
pub mod classify;
pub mod dns;
pub mod smtp;
