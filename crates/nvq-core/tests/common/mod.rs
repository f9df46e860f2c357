pub mod nvue_server;
