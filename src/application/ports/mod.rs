pub mod delivery_notifier;
