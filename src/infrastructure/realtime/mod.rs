mod delivery_hub;

pub use delivery_hub::*;
