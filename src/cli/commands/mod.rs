pub mod cedula;
pub mod completions;
pub mod config;
pub mod jornada;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod status;
pub mod tiempo;
pub mod watch;
