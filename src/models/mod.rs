pub mod answer;
pub mod option;
pub mod question;
pub mod result;
pub mod test;
pub mod user;
