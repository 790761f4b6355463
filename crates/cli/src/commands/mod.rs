pub mod products;
pub mod shell;
