pub mod delivery_socket;
