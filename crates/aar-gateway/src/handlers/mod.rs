pub mod health;
pub mod run;
pub mod sessions;
