pub mod attendee;
pub mod redemption;
