pub mod monster;
