// tollgate/src/commands/mod.rs

pub mod clean;
pub mod history;
pub mod inspect;
pub mod run;
pub mod seed;
pub mod validate;
