pub mod attendee;
pub mod codes;
pub mod health;
pub mod scan;
