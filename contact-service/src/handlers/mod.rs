pub mod contact;
pub mod health;
