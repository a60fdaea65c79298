pub mod certbot;
pub mod dns;
pub mod http;
pub mod nginx;
pub mod persistence;
