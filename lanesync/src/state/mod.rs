pub mod db;
pub mod hash;
