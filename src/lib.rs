pub mod atingi;
pub mod cli;
