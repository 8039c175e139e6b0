pub mod errors;
pub mod db;
pub mod user;
pub mod technician;
pub mod booking;
pub mod review;
