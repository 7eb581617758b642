pub mod genesis;
pub mod simulation;
