pub mod channelling;
pub mod domains;
pub mod sat;
