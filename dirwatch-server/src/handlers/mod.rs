pub mod files;
pub mod health;
pub mod legacy;
pub mod task;
