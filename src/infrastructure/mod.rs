pub mod db;
pub mod realtime;
