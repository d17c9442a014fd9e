pub mod wish_dispatcher;
